//! Compute Budget program decoder.

use borsh::BorshDeserialize;
use serde_json::json;
use solana_compute_budget_interface::ComputeBudgetInstruction;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use super::decoded;
use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

pub const COMPUTE_BUDGET_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("ComputeBudget111111111111111111111111111111");

#[derive(Debug, Default, Clone, Copy)]
pub struct ComputeBudgetInstructionDecoder;

impl InstructionDecoder for ComputeBudgetInstructionDecoder {
    fn program_name(&self) -> &str {
        "Compute Budget Program"
    }

    #[allow(deprecated)]
    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        let mut data = instruction.data.as_slice();
        let compute_budget_instruction = ComputeBudgetInstruction::deserialize(&mut data)
            .map_err(|_| DecodeError::UnrecognizedLayout)?;
        let (name, args) = match compute_budget_instruction {
            // Retired `RequestUnits` slot.
            ComputeBudgetInstruction::Unused => ("Unused", json!({})),
            ComputeBudgetInstruction::RequestHeapFrame(bytes) => {
                ("RequestHeapFrame", json!({ "bytes": bytes }))
            }
            ComputeBudgetInstruction::SetComputeUnitLimit(units) => {
                ("SetComputeUnitLimit", json!({ "units": units }))
            }
            ComputeBudgetInstruction::SetComputeUnitPrice(micro_lamports) => {
                ("SetComputeUnitPrice", json!({ "microLamports": micro_lamports }))
            }
            ComputeBudgetInstruction::SetLoadedAccountsDataSizeLimit(bytes) => {
                ("SetLoadedAccountsDataSizeLimit", json!({ "bytes": bytes }))
            }
            #[allow(unreachable_patterns)]
            _ => return Err(DecodeError::UnrecognizedLayout),
        };
        Ok(decoded(instruction, name, &[], args))
    }
}
