//! SPL Token and Token 2022 instruction decoder.
//!
//! Both programs share the base instruction set, so a single decoder unpacks
//! data with the Token 2022 [`TokenInstruction`] layout. Extension instructions
//! other than the mint and account setup ones listed below are not decoded.

use serde_json::{json, Value};
use solana_instruction::Instruction;
use solana_program_option::COption;
use solana_pubkey::Pubkey;
use spl_token_2022_interface::instruction::TokenInstruction;

use super::decoded;
use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

pub const TOKEN_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA");
pub const TOKEN_2022_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("TokenzQdBNbLqP5VEhdkAS6EPFLC1PHnBqCXEpPxuEb");

#[derive(Debug, Clone, Copy)]
pub struct SplTokenInstructionDecoder {
    program_name: &'static str,
}

impl SplTokenInstructionDecoder {
    pub fn token() -> Self {
        Self {
            program_name: "Token Program",
        }
    }

    pub fn token_2022() -> Self {
        Self {
            program_name: "Token 2022 Program",
        }
    }
}

fn optional_pubkey(key: COption<Pubkey>) -> Value {
    match key {
        COption::Some(key) => Value::from(key.to_string()),
        COption::None => Value::Null,
    }
}

impl InstructionDecoder for SplTokenInstructionDecoder {
    fn program_name(&self) -> &str {
        self.program_name
    }

    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        let token_instruction = TokenInstruction::unpack(&instruction.data)
            .map_err(|_| DecodeError::UnrecognizedLayout)?;
        let (name, accounts, args): (&str, &[&str], _) = match token_instruction {
            TokenInstruction::InitializeMint {
                decimals,
                mint_authority,
                freeze_authority,
            } => (
                "InitializeMint",
                &["mint", "rentSysvar"],
                json!({
                    "decimals": decimals,
                    "mintAuthority": mint_authority.to_string(),
                    "freezeAuthority": optional_pubkey(freeze_authority),
                }),
            ),
            TokenInstruction::InitializeAccount => (
                "InitializeAccount",
                &["account", "mint", "owner", "rentSysvar"],
                json!({}),
            ),
            TokenInstruction::InitializeMultisig { m } => {
                ("InitializeMultisig", &["multisig", "rentSysvar"], json!({ "m": m }))
            }
            TokenInstruction::Transfer { amount } => (
                "Transfer",
                &["source", "destination", "authority"],
                json!({ "amount": amount }),
            ),
            TokenInstruction::Approve { amount } => (
                "Approve",
                &["source", "delegate", "owner"],
                json!({ "amount": amount }),
            ),
            TokenInstruction::Revoke => ("Revoke", &["source", "owner"], json!({})),
            TokenInstruction::SetAuthority {
                authority_type,
                new_authority,
            } => (
                "SetAuthority",
                &["account", "currentAuthority"],
                json!({
                    "authorityType": format!("{authority_type:?}"),
                    "newAuthority": optional_pubkey(new_authority),
                }),
            ),
            TokenInstruction::MintTo { amount } => (
                "MintTo",
                &["mint", "account", "mintAuthority"],
                json!({ "amount": amount }),
            ),
            TokenInstruction::Burn { amount } => (
                "Burn",
                &["account", "mint", "authority"],
                json!({ "amount": amount }),
            ),
            TokenInstruction::CloseAccount => (
                "CloseAccount",
                &["account", "destination", "owner"],
                json!({}),
            ),
            TokenInstruction::FreezeAccount => (
                "FreezeAccount",
                &["account", "mint", "freezeAuthority"],
                json!({}),
            ),
            TokenInstruction::ThawAccount => (
                "ThawAccount",
                &["account", "mint", "freezeAuthority"],
                json!({}),
            ),
            TokenInstruction::TransferChecked { amount, decimals } => (
                "TransferChecked",
                &["source", "mint", "destination", "authority"],
                json!({ "amount": amount, "decimals": decimals }),
            ),
            TokenInstruction::ApproveChecked { amount, decimals } => (
                "ApproveChecked",
                &["source", "mint", "delegate", "owner"],
                json!({ "amount": amount, "decimals": decimals }),
            ),
            TokenInstruction::MintToChecked { amount, decimals } => (
                "MintToChecked",
                &["mint", "account", "mintAuthority"],
                json!({ "amount": amount, "decimals": decimals }),
            ),
            TokenInstruction::BurnChecked { amount, decimals } => (
                "BurnChecked",
                &["account", "mint", "authority"],
                json!({ "amount": amount, "decimals": decimals }),
            ),
            TokenInstruction::InitializeAccount2 { owner } => (
                "InitializeAccount2",
                &["account", "mint", "rentSysvar"],
                json!({ "owner": owner.to_string() }),
            ),
            TokenInstruction::SyncNative => ("SyncNative", &["account"], json!({})),
            TokenInstruction::InitializeAccount3 { owner } => (
                "InitializeAccount3",
                &["account", "mint"],
                json!({ "owner": owner.to_string() }),
            ),
            TokenInstruction::InitializeMultisig2 { m } => {
                ("InitializeMultisig2", &["multisig"], json!({ "m": m }))
            }
            TokenInstruction::InitializeMint2 {
                decimals,
                mint_authority,
                freeze_authority,
            } => (
                "InitializeMint2",
                &["mint"],
                json!({
                    "decimals": decimals,
                    "mintAuthority": mint_authority.to_string(),
                    "freezeAuthority": optional_pubkey(freeze_authority),
                }),
            ),
            TokenInstruction::GetAccountDataSize { extension_types } => (
                "GetAccountDataSize",
                &["mint"],
                json!({
                    "extensionTypes": extension_types
                        .iter()
                        .map(|extension| format!("{extension:?}"))
                        .collect::<Vec<_>>(),
                }),
            ),
            TokenInstruction::InitializeImmutableOwner => {
                ("InitializeImmutableOwner", &["account"], json!({}))
            }
            TokenInstruction::AmountToUiAmount { amount } => {
                ("AmountToUiAmount", &["mint"], json!({ "amount": amount }))
            }
            TokenInstruction::UiAmountToAmount { ui_amount } => {
                ("UiAmountToAmount", &["mint"], json!({ "uiAmount": ui_amount }))
            }
            TokenInstruction::InitializeMintCloseAuthority { close_authority } => (
                "InitializeMintCloseAuthority",
                &["mint"],
                json!({ "closeAuthority": optional_pubkey(close_authority) }),
            ),
            TokenInstruction::CreateNativeMint => (
                "CreateNativeMint",
                &["payer", "nativeMint", "systemProgram"],
                json!({}),
            ),
            TokenInstruction::InitializeNonTransferableMint => {
                ("InitializeNonTransferableMint", &["mint"], json!({}))
            }
            TokenInstruction::InitializePermanentDelegate { delegate } => (
                "InitializePermanentDelegate",
                &["mint"],
                json!({ "delegate": delegate.to_string() }),
            ),
            TokenInstruction::WithdrawExcessLamports => (
                "WithdrawExcessLamports",
                &["source", "destination", "authority"],
                json!({}),
            ),
            _ => return Err(DecodeError::UnrecognizedLayout),
        };
        Ok(decoded(instruction, name, accounts, args))
    }
}
