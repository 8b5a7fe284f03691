//! Format adapters: each converts one transaction shape into raw instructions.
//!
//! | Shape                          | Adapter                                 |
//! |--------------------------------|-----------------------------------------|
//! | `VersionedMessage` + ALT keys  | [`compiled::CompiledTransaction`]       |
//! | legacy `Message`               | [`compiled::resolve_legacy_message`]    |
//! | RPC `jsonParsed`               | [`ui::UiConfirmedTransaction`]          |
//! | signed bytes / base64 dump     | [`raw::decode_raw_transaction`]         |

pub mod compiled;
pub mod raw;
pub mod ui;

use solana_instruction::Instruction;

use crate::flatten::{flatten_instructions, FlattenedInstruction, InnerInstructionGroup};

/// Top-level and inner instructions with every account index resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTransaction {
    pub instructions: Vec<Instruction>,
    pub inner_instructions: Vec<InnerInstructionGroup<Instruction>>,
}

impl ResolvedTransaction {
    /// Flatten into execution order.
    pub fn flatten(self, include_inner: bool) -> Vec<FlattenedInstruction> {
        flatten_instructions(self.instructions, self.inner_instructions, include_inner)
    }
}
