//! Associated Token Account program decoder.

use serde_json::json;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use super::decoded;
use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

pub const ASSOCIATED_TOKEN_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("ATokenGPvbdGVxr1b2hvZbsiqW5xWH25efTNsLJA8knL");

const CREATE_ACCOUNTS: &[&str] = &[
    "payer",
    "associatedAccount",
    "wallet",
    "mint",
    "systemProgram",
    "tokenProgram",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct AssociatedTokenInstructionDecoder;

impl InstructionDecoder for AssociatedTokenInstructionDecoder {
    fn program_name(&self) -> &str {
        "Associated Token Account Program"
    }

    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        // Empty data is the original `Create` encoding.
        let (name, accounts) = match instruction.data.first().copied() {
            None | Some(0) => ("Create", CREATE_ACCOUNTS),
            Some(1) => ("CreateIdempotent", CREATE_ACCOUNTS),
            Some(2) => (
                "RecoverNested",
                &[
                    "nestedAccount",
                    "nestedMint",
                    "destinationAccount",
                    "ownerAccount",
                    "ownerMint",
                    "wallet",
                    "tokenProgram",
                ][..],
            ),
            Some(_) => return Err(DecodeError::UnrecognizedLayout),
        };
        Ok(decoded(instruction, name, accounts, json!({})))
    }
}
