//! Decoder dispatch table: program id -> decoder.

use std::{collections::HashMap, sync::Arc};

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
    registry::CompiledSchema,
};

/// The decode capability registered for a program.
#[derive(Clone)]
pub enum Decoder {
    /// Decodes through a registered schema and its codec handle.
    Schema(Arc<CompiledSchema>),
    /// Built-in or caller-supplied decode function.
    Custom(Arc<dyn InstructionDecoder>),
}

impl Decoder {
    pub fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        match self {
            Decoder::Schema(schema) => schema.decode(instruction),
            Decoder::Custom(decoder) => decoder.decode(instruction),
        }
    }

    pub fn program_name(&self) -> &str {
        match self {
            Decoder::Schema(schema) => &schema.schema().name,
            Decoder::Custom(decoder) => decoder.program_name(),
        }
    }
}

impl std::fmt::Debug for Decoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decoder::Schema(schema) => f.debug_tuple("Schema").field(schema).finish(),
            Decoder::Custom(decoder) => f.debug_tuple("Custom").field(&decoder.program_name()).finish(),
        }
    }
}

/// Program id keyed decoders. Last write wins.
#[derive(Debug, Default, Clone)]
pub struct DecoderTable {
    decoders: HashMap<Pubkey, Decoder>,
}

impl DecoderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the decoder for `program_id`.
    pub fn set(&mut self, program_id: Pubkey, decoder: Decoder) {
        self.decoders.insert(program_id, decoder);
    }

    /// Remove the decoder for `program_id`; no-op when absent.
    pub fn remove(&mut self, program_id: &Pubkey) -> Option<Decoder> {
        self.decoders.remove(program_id)
    }

    pub fn has(&self, program_id: &Pubkey) -> bool {
        self.decoders.contains_key(program_id)
    }

    pub fn get(&self, program_id: &Pubkey) -> Option<&Decoder> {
        self.decoders.get(program_id)
    }

    /// Registered program ids, sorted.
    pub fn program_ids(&self) -> Vec<Pubkey> {
        let mut ids: Vec<Pubkey> = self.decoders.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}
