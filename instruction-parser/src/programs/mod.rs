//! Built-in decoders for native Solana programs.
//!
//! Each decoder unpacks data with the program's interface crate and maps the
//! resulting enum onto names and arguments:
//! - bincode (u32 variant index): System Program, Stake Program
//! - packed, 1-byte tag: SPL Token, Token 2022
//! - borsh, 1-byte tag: Compute Budget, Associated Token Account

pub mod associated_token;
pub mod compute_budget;
pub mod spl_token;
pub mod stake;
pub mod system;

use std::sync::Arc;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

pub use associated_token::{AssociatedTokenInstructionDecoder, ASSOCIATED_TOKEN_PROGRAM_ID};
pub use compute_budget::{ComputeBudgetInstructionDecoder, COMPUTE_BUDGET_PROGRAM_ID};
pub use spl_token::{SplTokenInstructionDecoder, TOKEN_2022_PROGRAM_ID, TOKEN_PROGRAM_ID};
pub use stake::{StakeInstructionDecoder, STAKE_PROGRAM_ID};
pub use system::{SystemInstructionDecoder, SYSTEM_PROGRAM_ID};

use crate::{
    binder::bind_accounts,
    core::{InstructionArgs, InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

/// Largest instruction payload a transaction packet can carry.
const PACKET_DATA_SIZE: u64 = 1232;

/// The fixed built-in decoder set, keyed by program id.
pub fn builtin_decoders() -> Vec<(Pubkey, Arc<dyn InstructionDecoder>)> {
    let token: Arc<dyn InstructionDecoder> = Arc::new(SplTokenInstructionDecoder::token());
    let token_2022: Arc<dyn InstructionDecoder> =
        Arc::new(SplTokenInstructionDecoder::token_2022());
    vec![
        (SYSTEM_PROGRAM_ID, Arc::new(SystemInstructionDecoder) as Arc<dyn InstructionDecoder>),
        (TOKEN_PROGRAM_ID, token),
        (TOKEN_2022_PROGRAM_ID, token_2022),
        (ASSOCIATED_TOKEN_PROGRAM_ID, Arc::new(AssociatedTokenInstructionDecoder)),
        (COMPUTE_BUDGET_PROGRAM_ID, Arc::new(ComputeBudgetInstructionDecoder)),
        (STAKE_PROGRAM_ID, Arc::new(StakeInstructionDecoder)),
    ]
}

/// bincode with an input limit, so length prefixes cannot outgrow a packet.
fn limited_deserialize<T: DeserializeOwned>(data: &[u8]) -> Result<T, DecodeError> {
    bincode::options()
        .with_limit(PACKET_DATA_SIZE)
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .deserialize_from(data)
        .map_err(|_| DecodeError::UnrecognizedLayout)
}

/// Build a decoded record, binding `accounts` names positionally.
fn decoded(
    instruction: &Instruction,
    name: &str,
    accounts: &[&str],
    args: Value,
) -> NormalizedInstruction {
    let args = match args {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    NormalizedInstruction {
        name: name.to_string(),
        program_id: instruction.program_id,
        accounts: bind_accounts(&instruction.accounts, accounts),
        args: InstructionArgs::Decoded(args),
        parent_program_id: None,
    }
}
