//! LiteSVM integration.
//!
//! Provides:
//! - [`compiled_transaction_from_result`] -- pair a sent transaction with the
//!   inner instructions LiteSVM recorded for it and the keys its lookup
//!   tables load
//! - [`capture_account_states`] and [`account_changes`] -- pre/post account
//!   state (lamports, data length, owner) and the accounts that changed
//! - [`ParsingLogger`] -- sends a transaction, parses it and logs the tables

use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use litesvm::{
    types::{FailedTransactionMetadata, TransactionResult},
    LiteSVM,
};
use solana_address_lookup_table_interface::state::AddressLookupTable;
use solana_pubkey::Pubkey;
use solana_transaction::versioned::VersionedTransaction;
use tabled::{settings::Style, Table, Tabled};

use crate::{
    adapters::compiled::{load_lookup_table_addresses, CompiledTransaction},
    core::NormalizedInstruction,
    error::TransactionError,
    flatten::InnerInstructionGroup,
    formatter::InstructionFormatter,
    parser::InstructionParser,
};

/// Lamports, data length and owner of one account at a point in time.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AccountState {
    pub lamports: u64,
    pub data_len: usize,
    pub owner: Pubkey,
}

pub type AccountStates = HashMap<Pubkey, AccountState>;

/// State of every static account key of `tx`. Missing accounts read as
/// [`AccountState::default`].
pub fn capture_account_states(svm: &LiteSVM, tx: &VersionedTransaction) -> AccountStates {
    tx.message
        .static_account_keys()
        .iter()
        .map(|key| {
            let state = svm
                .get_account(key)
                .map(|account| AccountState {
                    lamports: account.lamports,
                    data_len: account.data.len(),
                    owner: account.owner,
                })
                .unwrap_or_default();
            (*key, state)
        })
        .collect()
}

/// One account whose state differs between two captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountChange {
    pub pubkey: Pubkey,
    pub before: AccountState,
    pub after: AccountState,
}

impl AccountChange {
    pub fn lamport_delta(&self) -> i128 {
        i128::from(self.after.lamports) - i128::from(self.before.lamports)
    }
}

/// Accounts present in either capture whose state changed, sorted by pubkey.
pub fn account_changes(pre: &AccountStates, post: &AccountStates) -> Vec<AccountChange> {
    let mut keys: Vec<&Pubkey> = pre.keys().chain(post.keys()).collect();
    keys.sort_unstable();
    keys.dedup();
    keys.into_iter()
        .filter_map(|key| {
            let before = pre.get(key).copied().unwrap_or_default();
            let after = post.get(key).copied().unwrap_or_default();
            (before != after).then_some(AccountChange {
                pubkey: *key,
                before,
                after,
            })
        })
        .collect()
}

#[derive(Tabled)]
struct AccountChangeRow {
    pubkey: String,
    owner: String,
    #[tabled(rename = "data len")]
    data_len: String,
    lamports: u64,
    change: String,
}

/// One row per changed account.
pub fn format_account_changes(changes: &[AccountChange]) -> String {
    let rows = changes.iter().map(|change| AccountChangeRow {
        pubkey: change.pubkey.to_string(),
        owner: change.after.owner.to_string(),
        data_len: if change.before.data_len == change.after.data_len {
            change.after.data_len.to_string()
        } else {
            format!("{} -> {}", change.before.data_len, change.after.data_len)
        },
        lamports: change.after.lamports,
        change: format!("{:+}", change.lamport_delta()),
    });
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Build a [`CompiledTransaction`] from a LiteSVM send result.
///
/// LiteSVM reports one inner list per top-level instruction, by position;
/// empty lists are skipped. Failed transactions keep the inner instructions
/// executed before the failure. Address lookup tables are read from the
/// SVM's account store.
pub fn compiled_transaction_from_result(
    svm: &LiteSVM,
    tx: &VersionedTransaction,
    result: &TransactionResult,
) -> Result<CompiledTransaction, TransactionError> {
    let meta = match result {
        Ok(meta) => meta,
        Err(FailedTransactionMetadata { meta, .. }) => meta,
    };

    let inner_instructions = meta
        .inner_instructions
        .iter()
        .enumerate()
        .filter(|(_, inner)| !inner.is_empty())
        .filter_map(|(index, inner)| {
            let index = u8::try_from(index).ok()?;
            Some(InnerInstructionGroup::new(
                index,
                inner.iter().map(|ix| ix.instruction.clone()).collect(),
            ))
        })
        .collect();

    let compiled =
        CompiledTransaction::new(tx.message.clone()).with_inner_instructions(inner_instructions);
    if tx
        .message
        .address_table_lookups()
        .map_or(true, <[_]>::is_empty)
    {
        return Ok(compiled);
    }
    let loaded = load_lookup_table_addresses(&tx.message, |table| {
        lookup_table_addresses(svm, table)
    })?;
    Ok(compiled.with_loaded_addresses(loaded))
}

fn lookup_table_addresses(svm: &LiteSVM, table: &Pubkey) -> Option<Vec<Pubkey>> {
    let account = svm.get_account(table)?;
    match AddressLookupTable::deserialize(&account.data) {
        Ok(lookup_table) => Some(lookup_table.addresses.to_vec()),
        Err(err) => {
            tracing::debug!(table = %table, error = ?err, "not an address lookup table");
            None
        }
    }
}

/// Sends transactions through LiteSVM and logs their parsed instructions.
///
/// # Example
/// ```ignore
/// let logger = ParsingLogger::new(InstructionParser::from_env());
/// let result = logger.send_transaction(&mut svm, tx);
/// ```
#[derive(Debug)]
pub struct ParsingLogger {
    parser: InstructionParser,
    counter: AtomicUsize,
}

impl ParsingLogger {
    pub fn new(parser: InstructionParser) -> Self {
        Self {
            parser,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn parser(&self) -> &InstructionParser {
        &self.parser
    }

    pub fn parser_mut(&mut self) -> &mut InstructionParser {
        &mut self.parser
    }

    /// Send `tx`, parse it with inner instructions and log the result
    /// together with the accounts whose state changed.
    ///
    /// Returns the raw `TransactionResult` so callers can assert on it.
    pub fn send_transaction(&self, svm: &mut LiteSVM, tx: VersionedTransaction) -> TransactionResult {
        let pre_states = capture_account_states(svm, &tx);
        let result = svm.send_transaction(tx.clone());
        let post_states = capture_account_states(svm, &tx);

        // Parse failures are logged inside `parse_result`.
        let _ = self.parse_result(svm, &tx, &result);
        let changes = account_changes(&pre_states, &post_states);
        if !changes.is_empty() {
            tracing::debug!(
                changed = changes.len(),
                "account changes\n{}",
                format_account_changes(&changes)
            );
        }
        result
    }

    /// Parse a sent transaction and log the rendered table.
    pub fn parse_result(
        &self,
        svm: &LiteSVM,
        tx: &VersionedTransaction,
        result: &TransactionResult,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        let tx_number = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        let parsed = match compiled_transaction_from_result(svm, tx, result)
            .and_then(|compiled| self.parser.parse_compiled_transaction(&compiled, true))
        {
            Ok(parsed) => parsed,
            Err(err) => {
                tracing::warn!(tx_number, error = %err, "cannot resolve transaction");
                return Err(err);
            }
        };

        let table = InstructionFormatter::new(&self.parser).format_detailed(&parsed);
        let signature = tx.signatures.first().copied().unwrap_or_default();
        match result {
            Ok(meta) => tracing::info!(
                tx_number,
                signature = %signature,
                compute_units = meta.compute_units_consumed,
                "transaction succeeded\n{table}"
            ),
            Err(FailedTransactionMetadata { err, meta }) => tracing::warn!(
                tx_number,
                signature = %signature,
                compute_units = meta.compute_units_consumed,
                error = ?err,
                "transaction failed\n{table}"
            ),
        }
        Ok(parsed)
    }
}
