//! Raw signed transaction bytes.

use base64::{engine::general_purpose::STANDARD, Engine};
use solana_message::VersionedMessage;
use solana_transaction::versioned::VersionedTransaction;

use super::{
    compiled::{resolve_legacy_message, CompiledTransaction},
    ResolvedTransaction,
};
use crate::error::TransactionError;

/// Deserialize a bincode-encoded signed transaction.
pub fn decode_raw_transaction(bytes: &[u8]) -> Result<VersionedTransaction, TransactionError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Deserialize a base64 transaction dump, as printed by explorers and RPC
/// `base64` encodings.
pub fn decode_transaction_dump(dump: &str) -> Result<VersionedTransaction, TransactionError> {
    let bytes = STANDARD.decode(dump.trim())?;
    decode_raw_transaction(&bytes)
}

/// Resolve a signed transaction's message.
///
/// Signed bytes carry no inner instructions and no loaded addresses, so a v0
/// message that references lookup-table indices fails to resolve.
pub fn resolve_transaction(
    transaction: &VersionedTransaction,
) -> Result<ResolvedTransaction, TransactionError> {
    match &transaction.message {
        VersionedMessage::Legacy(message) => resolve_legacy_message(message, &[]),
        VersionedMessage::V0(_) => CompiledTransaction::new(transaction.message.clone()).resolve(),
    }
}
