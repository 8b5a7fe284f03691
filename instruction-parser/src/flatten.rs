//! Flattening of top-level and inner instructions into execution order.

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

/// Inner instructions reported for the top-level instruction at `index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerInstructionGroup<T> {
    pub index: u8,
    pub instructions: Vec<T>,
}

impl<T> InnerInstructionGroup<T> {
    pub fn new(index: u8, instructions: Vec<T>) -> Self {
        Self {
            index,
            instructions,
        }
    }
}

/// One entry of a flattened transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenedInstruction<T = Instruction> {
    pub instruction: T,
    /// Program id of the enclosing top-level instruction; `None` at top level.
    pub parent_program_id: Option<Pubkey>,
}

/// Flatten raw instructions: each top-level instruction is followed by its
/// inner instructions, attributed to the top-level program id.
pub fn flatten_instructions(
    top_level: Vec<Instruction>,
    inner: Vec<InnerInstructionGroup<Instruction>>,
    include_inner: bool,
) -> Vec<FlattenedInstruction> {
    flatten_with(top_level, inner, include_inner, |ix| ix.program_id)
}

/// Generic form of [`flatten_instructions`] for any instruction shape.
///
/// Attribution is one level deep: inner instructions of any CPI depth point
/// at the top-level program, never at an intermediate caller. Groups whose
/// index names no top-level instruction are dropped; several groups for the
/// same index are emitted in the order reported.
pub fn flatten_with<T, F>(
    top_level: Vec<T>,
    inner: Vec<InnerInstructionGroup<T>>,
    include_inner: bool,
    program_id_of: F,
) -> Vec<FlattenedInstruction<T>>
where
    F: Fn(&T) -> Pubkey,
{
    let mut nested: Vec<Vec<T>> = Vec::new();
    if include_inner {
        nested.resize_with(top_level.len(), Vec::new);
        for group in inner {
            match nested.get_mut(group.index as usize) {
                Some(slot) => slot.extend(group.instructions),
                None => tracing::warn!(
                    index = group.index,
                    top_level = top_level.len(),
                    dropped = group.instructions.len(),
                    "inner instruction group has no matching top-level instruction"
                ),
            }
        }
    }

    let capacity = top_level.len() + nested.iter().map(Vec::len).sum::<usize>();
    let mut flattened = Vec::with_capacity(capacity);
    let mut nested = nested.into_iter();

    for instruction in top_level {
        let parent = program_id_of(&instruction);
        flattened.push(FlattenedInstruction {
            instruction,
            parent_program_id: None,
        });
        if let Some(children) = nested.next() {
            flattened.extend(children.into_iter().map(|child| FlattenedInstruction {
                instruction: child,
                parent_program_id: Some(parent),
            }));
        }
    }

    flattened
}
