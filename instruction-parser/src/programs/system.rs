//! System Program instruction decoder.
//!
//! Instruction data is the bincode encoding of [`SystemInstruction`]: a u32
//! little-endian variant index followed by the variant's fields.

use serde_json::json;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use solana_system_interface::instruction::SystemInstruction;

use super::{decoded, limited_deserialize};
use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

pub const SYSTEM_PROGRAM_ID: Pubkey = solana_pubkey::pubkey!("11111111111111111111111111111111");

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemInstructionDecoder;

impl InstructionDecoder for SystemInstructionDecoder {
    fn program_name(&self) -> &str {
        "System Program"
    }

    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        let (name, accounts, args): (&str, &[&str], _) =
            match limited_deserialize::<SystemInstruction>(&instruction.data)? {
                SystemInstruction::CreateAccount {
                    lamports,
                    space,
                    owner,
                } => (
                    "CreateAccount",
                    &["from", "newAccount"],
                    json!({
                        "lamports": lamports,
                        "space": space,
                        "owner": owner.to_string(),
                    }),
                ),
                SystemInstruction::Assign { owner } => (
                    "Assign",
                    &["account"],
                    json!({ "owner": owner.to_string() }),
                ),
                SystemInstruction::Transfer { lamports } => {
                    ("Transfer", &["from", "to"], json!({ "lamports": lamports }))
                }
                SystemInstruction::CreateAccountWithSeed {
                    base,
                    seed,
                    lamports,
                    space,
                    owner,
                } => (
                    "CreateAccountWithSeed",
                    &["from", "newAccount", "base"],
                    json!({
                        "base": base.to_string(),
                        "seed": seed,
                        "lamports": lamports,
                        "space": space,
                        "owner": owner.to_string(),
                    }),
                ),
                SystemInstruction::AdvanceNonceAccount => (
                    "AdvanceNonceAccount",
                    &["nonceAccount", "recentBlockhashesSysvar", "nonceAuthority"],
                    json!({}),
                ),
                SystemInstruction::WithdrawNonceAccount(lamports) => (
                    "WithdrawNonceAccount",
                    &[
                        "nonceAccount",
                        "to",
                        "recentBlockhashesSysvar",
                        "rentSysvar",
                        "nonceAuthority",
                    ],
                    json!({ "lamports": lamports }),
                ),
                SystemInstruction::InitializeNonceAccount(authority) => (
                    "InitializeNonceAccount",
                    &["nonceAccount", "recentBlockhashesSysvar", "rentSysvar"],
                    json!({ "authority": authority.to_string() }),
                ),
                SystemInstruction::AuthorizeNonceAccount(new_authority) => (
                    "AuthorizeNonceAccount",
                    &["nonceAccount", "nonceAuthority"],
                    json!({ "newAuthority": new_authority.to_string() }),
                ),
                SystemInstruction::Allocate { space } => {
                    ("Allocate", &["account"], json!({ "space": space }))
                }
                SystemInstruction::AllocateWithSeed {
                    base,
                    seed,
                    space,
                    owner,
                } => (
                    "AllocateWithSeed",
                    &["account", "base"],
                    json!({
                        "base": base.to_string(),
                        "seed": seed,
                        "space": space,
                        "owner": owner.to_string(),
                    }),
                ),
                SystemInstruction::AssignWithSeed { base, seed, owner } => (
                    "AssignWithSeed",
                    &["account", "base"],
                    json!({
                        "base": base.to_string(),
                        "seed": seed,
                        "owner": owner.to_string(),
                    }),
                ),
                SystemInstruction::TransferWithSeed {
                    lamports,
                    from_seed,
                    from_owner,
                } => (
                    "TransferWithSeed",
                    &["from", "base", "to"],
                    json!({
                        "lamports": lamports,
                        "fromSeed": from_seed,
                        "fromOwner": from_owner.to_string(),
                    }),
                ),
                SystemInstruction::UpgradeNonceAccount => {
                    ("UpgradeNonceAccount", &["nonceAccount"], json!({}))
                }
                #[allow(unreachable_patterns)]
                _ => return Err(DecodeError::UnrecognizedLayout),
            };
        Ok(decoded(instruction, name, accounts, args))
    }
}
