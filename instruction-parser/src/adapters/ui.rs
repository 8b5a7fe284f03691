//! Pre-annotated transactions in the RPC `jsonParsed` encoding.
//!
//! Entries the node already parsed become normalized records directly;
//! partially decoded entries become raw instructions for the normalizer.

use std::{collections::HashMap, str::FromStr};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::{
    core::{InstructionArgs, NormalizedInstruction},
    error::TransactionError,
    flatten::InnerInstructionGroup,
};

pub const MEMO_V1_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("Memo1UhkJRfHyvLMcVucJwxXeuD728EqVDDwQDxFMNo");
pub const MEMO_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("MemoSq4gqABAXKb96qnH8TysNcWxMyWCqXgDLGmfcHr");

/// A `getTransaction` result with `jsonParsed` encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfirmedTransaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<u64>,
    pub transaction: UiTransaction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<UiTransactionMeta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiTransaction {
    #[serde(default)]
    pub signatures: Vec<String>,
    pub message: UiParsedMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParsedMessage {
    pub account_keys: Vec<UiAccountKey>,
    #[serde(default)]
    pub recent_blockhash: String,
    pub instructions: Vec<UiInstruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiAccountKey {
    pub pubkey: String,
    pub writable: bool,
    pub signer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiTransactionMeta {
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub fee: u64,
    #[serde(default)]
    pub inner_instructions: Option<Vec<UiInnerInstructions>>,
    #[serde(default)]
    pub log_messages: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UiInnerInstructions {
    pub index: u8,
    pub instructions: Vec<UiInstruction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UiInstruction {
    Parsed(UiParsedInstruction),
    PartiallyDecoded(UiPartiallyDecodedInstruction),
}

/// An instruction the node classified itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiParsedInstruction {
    pub program: String,
    pub program_id: String,
    /// `{ "type": .., "info": {..} }` for most programs; the memo text for memo.
    pub parsed: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_height: Option<u32>,
}

/// An instruction left as base-58 bytes with resolved account addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPartiallyDecodedInstruction {
    pub program_id: String,
    pub accounts: Vec<String>,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_height: Option<u32>,
}

/// One adapted entry: either still raw or already normalized by the node.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotatedEntry {
    Raw(Instruction),
    Decoded(NormalizedInstruction),
}

impl AnnotatedEntry {
    pub fn program_id(&self) -> Pubkey {
        match self {
            AnnotatedEntry::Raw(ix) => ix.program_id,
            AnnotatedEntry::Decoded(ix) => ix.program_id,
        }
    }
}

/// Adapted top-level entries and inner groups.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedTransaction {
    pub entries: Vec<AnnotatedEntry>,
    pub inner_instructions: Vec<InnerInstructionGroup<AnnotatedEntry>>,
}

impl UiConfirmedTransaction {
    pub fn annotate(&self) -> Result<AnnotatedTransaction, TransactionError> {
        let message = &self.transaction.message;
        let flags = message
            .account_keys
            .iter()
            .map(|key| Ok((parse_pubkey(&key.pubkey)?, (key.signer, key.writable))))
            .collect::<Result<HashMap<_, _>, TransactionError>>()?;

        let entries = message
            .instructions
            .iter()
            .map(|ix| annotate_instruction(ix, &flags))
            .collect::<Result<Vec<_>, _>>()?;

        let inner_instructions = self
            .meta
            .as_ref()
            .and_then(|meta| meta.inner_instructions.as_deref())
            .unwrap_or_default()
            .iter()
            .map(|group| {
                group
                    .instructions
                    .iter()
                    .map(|ix| annotate_instruction(ix, &flags))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|entries| InnerInstructionGroup::new(group.index, entries))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(AnnotatedTransaction {
            entries,
            inner_instructions,
        })
    }
}

fn parse_pubkey(value: &str) -> Result<Pubkey, TransactionError> {
    Pubkey::from_str(value).map_err(|_| TransactionError::InvalidPubkey(value.to_string()))
}

fn annotate_instruction(
    instruction: &UiInstruction,
    flags: &HashMap<Pubkey, (bool, bool)>,
) -> Result<AnnotatedEntry, TransactionError> {
    match instruction {
        UiInstruction::Parsed(parsed) => {
            Ok(AnnotatedEntry::Decoded(parsed_to_normalized(parsed)?))
        }
        UiInstruction::PartiallyDecoded(partial) => {
            let accounts = partial
                .accounts
                .iter()
                .map(|account| {
                    let pubkey = parse_pubkey(account)?;
                    let (is_signer, is_writable) = flags.get(&pubkey).copied().unwrap_or_default();
                    Ok(AccountMeta {
                        pubkey,
                        is_signer,
                        is_writable,
                    })
                })
                .collect::<Result<Vec<_>, TransactionError>>()?;
            Ok(AnnotatedEntry::Raw(Instruction {
                program_id: parse_pubkey(&partial.program_id)?,
                accounts,
                data: bs58::decode(&partial.data).into_vec()?,
            }))
        }
    }
}

fn parsed_to_normalized(
    parsed: &UiParsedInstruction,
) -> Result<NormalizedInstruction, TransactionError> {
    let program_id = parse_pubkey(&parsed.program_id)?;

    let (name, args) = if program_id == MEMO_PROGRAM_ID || program_id == MEMO_V1_PROGRAM_ID {
        let mut args = Map::new();
        args.insert("message".to_string(), parsed.parsed.clone());
        ("Memo".to_string(), args)
    } else {
        let name = parsed
            .parsed
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or(parsed.program.as_str())
            .to_string();
        let args = match &parsed.parsed {
            Value::Object(payload) => match payload.get("info") {
                Some(Value::Object(info)) => info.clone(),
                Some(other) => Map::from_iter([("info".to_string(), other.clone())]),
                None => Map::new(),
            },
            Value::Null => Map::new(),
            // Some programs publish a bare string or array instead of `{type, info}`.
            other => Map::from_iter([("value".to_string(), other.clone())]),
        };
        (name, args)
    };

    Ok(NormalizedInstruction {
        name,
        program_id,
        accounts: Vec::new(),
        args: InstructionArgs::Decoded(args),
        parent_program_id: None,
    })
}
