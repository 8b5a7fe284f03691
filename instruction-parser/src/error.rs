//! Error types.
//!
//! Instruction-level failures ([`DecodeError`]) never leave the parser: they
//! are converted into unknown records at the normalizer boundary. The other
//! enums surface registration, envelope and fetch problems to callers.

use solana_pubkey::Pubkey;
use thiserror::Error;

/// Why a decoder could not produce a normalized instruction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The byte blob does not match any layout the decoder knows.
    #[error("instruction data does not match a known layout")]
    UnrecognizedLayout,
    /// The blob decoded to an instruction name the schema does not declare.
    #[error("instruction `{0}` is not declared by the program schema")]
    UnknownInstruction(String),
    /// The decoder itself failed.
    #[error("decoder fault: {0}")]
    Fault(String),
}

/// A schema definition could not be turned into a [`crate::ProgramSchema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed schema definition: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("unsupported argument type `{0}`")]
    UnsupportedType(String),
    #[error("type `{0}` is referenced but not defined")]
    UndefinedType(String),
    #[error("schema file {path}: {reason}")]
    File { path: String, reason: String },
}

/// Encoding or decoding arguments with a schema codec failed.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("instruction `{0}` is not part of the codec layout")]
    UnknownInstruction(String),
    #[error("missing argument `{0}`")]
    MissingArgument(String),
    #[error("argument `{field}` is not a valid {expected}")]
    TypeMismatch { field: String, expected: &'static str },
    #[error("type `{0}` is not defined")]
    UndefinedType(String),
    #[error("type nesting exceeds {0} levels")]
    DepthExceeded(usize),
}

/// A transaction envelope is structurally malformed.
#[derive(Debug, Error)]
pub enum TransactionError {
    #[error("account index {index} out of bounds ({len} account keys)")]
    AccountIndexOutOfBounds { index: u8, len: usize },
    #[error("address lookup table {0} not found")]
    LookupTableNotFound(Pubkey),
    #[error("index {index} out of bounds for address lookup table {table} ({len} addresses)")]
    LookupTableIndexOutOfBounds { table: Pubkey, index: u8, len: usize },
    #[error("invalid pubkey `{0}`")]
    InvalidPubkey(String),
    #[error("invalid base58 instruction data: {0}")]
    InvalidInstructionData(#[from] bs58::decode::Error),
    #[error("invalid base64 transaction dump: {0}")]
    InvalidDump(#[from] base64::DecodeError),
    #[error("failed to deserialize transaction: {0}")]
    Deserialize(#[from] bincode::Error),
}

/// Retrieving a transaction by signature failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transaction fetch failed: {0}")]
    Fetch(Box<dyn std::error::Error + Send + Sync>),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
}
