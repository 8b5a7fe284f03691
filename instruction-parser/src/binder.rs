//! Positional binding of instruction accounts to schema role names.

use solana_instruction::AccountMeta;

use crate::core::NamedAccount;

/// Prefix used for accounts past the end of the declared name list.
pub const REMAINING_ACCOUNT_PREFIX: &str = "Remaining";

/// Bind `names[i]` to `accounts[i]`.
///
/// Accounts beyond the declared names are called `"Remaining 0"`,
/// `"Remaining 1"`, ... so variable-length trailing account lists never fail.
/// The output always has exactly one entry per input account, in order.
pub fn bind_accounts<S: AsRef<str>>(accounts: &[AccountMeta], names: &[S]) -> Vec<NamedAccount> {
    accounts
        .iter()
        .enumerate()
        .map(|(i, meta)| match names.get(i) {
            Some(name) => NamedAccount::named(meta, name.as_ref()),
            None => NamedAccount::named(
                meta,
                format!("{REMAINING_ACCOUNT_PREFIX} {}", i - names.len()),
            ),
        })
        .collect()
}
