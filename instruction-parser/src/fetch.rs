//! Transaction retrieval by signature.
//!
//! No client ships with this crate; implement [`TransactionFetcher`] over an
//! RPC client or a local ledger and pass it to
//! [`crate::InstructionParser::parse_transaction_by_signature`].

use solana_signature::Signature;

use crate::adapters::compiled::CompiledTransaction;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Commitment {
    Processed,
    #[default]
    Confirmed,
    Finalized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    pub commitment: Commitment,
    /// Highest message version the caller accepts; `None` accepts legacy only.
    pub max_supported_transaction_version: Option<u8>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            commitment: Commitment::default(),
            max_supported_transaction_version: Some(0),
        }
    }
}

/// Source of compiled transactions.
///
/// `Ok(None)` means the signature is unknown to the source. Implementations
/// own retry and timeout policy.
pub trait TransactionFetcher {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_transaction(
        &self,
        signature: &Signature,
        options: &FetchOptions,
    ) -> Result<Option<CompiledTransaction>, Self::Error>;
}
