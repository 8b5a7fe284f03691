//! Core types for instruction normalization.

use serde::{ser::SerializeMap, Serialize, Serializer};
use serde_json::{Map, Value};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::error::DecodeError;

/// Name given to instructions that could not be decoded.
pub const UNKNOWN_INSTRUCTION: &str = "unknown";

/// An instruction account together with the role name bound to its position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedAccount {
    /// Role name from the schema; `None` inside unknown records.
    pub name: Option<String>,
    #[serde(serialize_with = "serialize_pubkey")]
    pub pubkey: Pubkey,
    pub is_signer: bool,
    pub is_writable: bool,
}

impl NamedAccount {
    pub fn named(meta: &AccountMeta, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            pubkey: meta.pubkey,
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        }
    }

    pub fn unnamed(meta: &AccountMeta) -> Self {
        Self {
            name: None,
            pubkey: meta.pubkey,
            is_signer: meta.is_signer,
            is_writable: meta.is_writable,
        }
    }

    pub fn meta(&self) -> AccountMeta {
        AccountMeta {
            pubkey: self.pubkey,
            is_signer: self.is_signer,
            is_writable: self.is_writable,
        }
    }
}

/// Decoded arguments, or the raw bytes when decoding did not succeed.
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionArgs {
    Decoded(Map<String, Value>),
    Unknown(Vec<u8>),
}

impl InstructionArgs {
    /// Look up a decoded argument by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            InstructionArgs::Decoded(args) => args.get(name),
            InstructionArgs::Unknown(_) => None,
        }
    }
}

impl Serialize for InstructionArgs {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InstructionArgs::Decoded(args) => args.serialize(serializer),
            InstructionArgs::Unknown(data) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("unknown", &bs58::encode(data).into_string())?;
                map.end()
            }
        }
    }
}

/// The uniform, human-inspectable form of one instruction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedInstruction {
    pub name: String,
    #[serde(serialize_with = "serialize_pubkey")]
    pub program_id: Pubkey,
    pub accounts: Vec<NamedAccount>,
    pub args: InstructionArgs,
    /// Program id of the top-level instruction this one was invoked under.
    #[serde(
        serialize_with = "serialize_optional_pubkey",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_program_id: Option<Pubkey>,
}

impl NormalizedInstruction {
    /// The fallback record: raw accounts, raw bytes, name `"unknown"`.
    pub fn unknown(instruction: &Instruction) -> Self {
        Self::unknown_named(instruction, UNKNOWN_INSTRUCTION)
    }

    /// A fallback record that keeps a decoded but undeclared name.
    pub fn unknown_named(instruction: &Instruction, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            program_id: instruction.program_id,
            accounts: instruction.accounts.iter().map(NamedAccount::unnamed).collect(),
            args: InstructionArgs::Unknown(instruction.data.clone()),
            parent_program_id: None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.args, InstructionArgs::Unknown(_))
    }

    pub fn with_parent(mut self, parent_program_id: Option<Pubkey>) -> Self {
        self.parent_program_id = parent_program_id;
        self
    }

    /// Account names in order; unnamed accounts yield an empty string.
    pub fn account_names(&self) -> Vec<&str> {
        self.accounts
            .iter()
            .map(|a| a.name.as_deref().unwrap_or_default())
            .collect()
    }
}

/// Trait for custom and built-in decoders - one per program.
pub trait InstructionDecoder: Send + Sync {
    /// Human-readable program name (e.g., "System Program").
    fn program_name(&self) -> &str;

    /// Decode one instruction addressed to this decoder's program.
    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError>;
}

impl<F> InstructionDecoder for F
where
    F: Fn(&Instruction) -> Result<NormalizedInstruction, DecodeError> + Send + Sync,
{
    fn program_name(&self) -> &str {
        "Custom Program"
    }

    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        self(instruction)
    }
}

pub(crate) fn serialize_pubkey<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(pubkey)
}

fn serialize_optional_pubkey<S: Serializer>(
    pubkey: &Option<Pubkey>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match pubkey {
        Some(pubkey) => serializer.collect_str(pubkey),
        None => serializer.serialize_none(),
    }
}
