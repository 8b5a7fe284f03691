//! Compiled messages: account indices resolved against the message's static
//! keys and, for v0 messages, the loaded address-table keys.

use solana_instruction::{AccountMeta, Instruction};
use solana_message::{
    compiled_instruction::CompiledInstruction, legacy::Message, v0::LoadedAddresses,
    VersionedMessage,
};
use solana_pubkey::Pubkey;

use super::ResolvedTransaction;
use crate::{error::TransactionError, flatten::InnerInstructionGroup};

/// A compiled transaction as returned by an RPC node or the simulator.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledTransaction {
    pub message: VersionedMessage,
    /// Keys loaded from address lookup tables, if the message uses any.
    pub loaded_addresses: Option<LoadedAddresses>,
    pub inner_instructions: Vec<InnerInstructionGroup<CompiledInstruction>>,
}

impl CompiledTransaction {
    pub fn new(message: VersionedMessage) -> Self {
        Self {
            message,
            loaded_addresses: None,
            inner_instructions: Vec::new(),
        }
    }

    pub fn with_loaded_addresses(mut self, loaded_addresses: LoadedAddresses) -> Self {
        self.loaded_addresses = Some(loaded_addresses);
        self
    }

    pub fn with_inner_instructions(
        mut self,
        inner_instructions: Vec<InnerInstructionGroup<CompiledInstruction>>,
    ) -> Self {
        self.inner_instructions = inner_instructions;
        self
    }

    /// Resolve every top-level and inner instruction.
    pub fn resolve(&self) -> Result<ResolvedTransaction, TransactionError> {
        let keys = AccountKeyTable::from_versioned(&self.message, self.loaded_addresses.as_ref());
        keys.resolve_all(self.message.instructions(), &self.inner_instructions)
    }
}

/// Collect the keys a v0 message loads through its address table lookups.
///
/// `table_addresses` returns the address list stored in a lookup table
/// account. Writable keys from every table come first, then read-only keys,
/// matching the order the runtime appends them to the static keys.
pub fn load_lookup_table_addresses<F>(
    message: &VersionedMessage,
    mut table_addresses: F,
) -> Result<LoadedAddresses, TransactionError>
where
    F: FnMut(&Pubkey) -> Option<Vec<Pubkey>>,
{
    let mut loaded = LoadedAddresses::default();
    for lookup in message.address_table_lookups().unwrap_or_default() {
        let addresses = table_addresses(&lookup.account_key)
            .ok_or(TransactionError::LookupTableNotFound(lookup.account_key))?;
        let select = |index: &u8| {
            addresses
                .get(*index as usize)
                .copied()
                .ok_or(TransactionError::LookupTableIndexOutOfBounds {
                    table: lookup.account_key,
                    index: *index,
                    len: addresses.len(),
                })
        };
        for index in &lookup.writable_indexes {
            loaded.writable.push(select(index)?);
        }
        for index in &lookup.readonly_indexes {
            loaded.readonly.push(select(index)?);
        }
    }
    Ok(loaded)
}

/// Resolve a legacy message; every account is explicit in `account_keys`.
pub fn resolve_legacy_message(
    message: &Message,
    inner_instructions: &[InnerInstructionGroup<CompiledInstruction>],
) -> Result<ResolvedTransaction, TransactionError> {
    AccountKeyTable::from_legacy(message).resolve_all(&message.instructions, inner_instructions)
}

/// Index-addressable account metas: static keys, then loaded writable keys,
/// then loaded read-only keys.
#[derive(Debug)]
struct AccountKeyTable {
    metas: Vec<AccountMeta>,
}

impl AccountKeyTable {
    fn from_versioned(message: &VersionedMessage, loaded: Option<&LoadedAddresses>) -> Self {
        let mut metas: Vec<AccountMeta> = message
            .static_account_keys()
            .iter()
            .enumerate()
            .map(|(i, key)| meta(*key, message.is_signer(i), message.is_maybe_writable(i, None)))
            .collect();
        if let Some(loaded) = loaded {
            metas.extend(loaded.writable.iter().map(|key| AccountMeta::new(*key, false)));
            metas.extend(
                loaded
                    .readonly
                    .iter()
                    .map(|key| AccountMeta::new_readonly(*key, false)),
            );
        }
        Self { metas }
    }

    fn from_legacy(message: &Message) -> Self {
        let metas = message
            .account_keys
            .iter()
            .enumerate()
            .map(|(i, key)| meta(*key, message.is_signer(i), message.is_maybe_writable(i, None)))
            .collect();
        Self { metas }
    }

    fn get(&self, index: u8) -> Result<&AccountMeta, TransactionError> {
        self.metas
            .get(index as usize)
            .ok_or(TransactionError::AccountIndexOutOfBounds {
                index,
                len: self.metas.len(),
            })
    }

    fn resolve(&self, compiled: &CompiledInstruction) -> Result<Instruction, TransactionError> {
        let program_id = self.get(compiled.program_id_index)?.pubkey;
        let accounts = compiled
            .accounts
            .iter()
            .map(|&index| self.get(index).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Instruction {
            program_id,
            accounts,
            data: compiled.data.clone(),
        })
    }

    fn resolve_all(
        &self,
        instructions: &[CompiledInstruction],
        inner_instructions: &[InnerInstructionGroup<CompiledInstruction>],
    ) -> Result<ResolvedTransaction, TransactionError> {
        let instructions = instructions
            .iter()
            .map(|ix| self.resolve(ix))
            .collect::<Result<Vec<_>, _>>()?;
        let inner_instructions = inner_instructions
            .iter()
            .map(|group| {
                group
                    .instructions
                    .iter()
                    .map(|ix| self.resolve(ix))
                    .collect::<Result<Vec<_>, _>>()
                    .map(|resolved| InnerInstructionGroup::new(group.index, resolved))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ResolvedTransaction {
            instructions,
            inner_instructions,
        })
    }
}

fn meta(pubkey: Pubkey, is_signer: bool, is_writable: bool) -> AccountMeta {
    if is_writable {
        AccountMeta::new(pubkey, is_signer)
    } else {
        AccountMeta::new_readonly(pubkey, is_signer)
    }
}
