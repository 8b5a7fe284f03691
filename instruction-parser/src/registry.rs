//! Schema registry: program id -> compiled schema.

use std::{collections::HashMap, sync::Arc};

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;

use crate::{
    binder::bind_accounts,
    codec::{BorshInstructionCodec, InstructionCodec},
    core::{InstructionArgs, NormalizedInstruction},
    error::DecodeError,
    schema::ProgramSchema,
};

/// A schema plus everything precomputed for decoding against it.
///
/// Account role names are flattened once here, not on every decode.
pub struct CompiledSchema {
    schema: ProgramSchema,
    account_names: HashMap<String, Vec<String>>,
    codec: Arc<dyn InstructionCodec>,
}

impl CompiledSchema {
    /// Compile `schema` with the bundled borsh codec.
    pub fn new(schema: ProgramSchema) -> Self {
        let codec = Arc::new(BorshInstructionCodec::new(&schema));
        Self::with_codec(schema, codec)
    }

    /// Compile `schema` and decode through a caller-supplied codec handle.
    pub fn with_codec(schema: ProgramSchema, codec: Arc<dyn InstructionCodec>) -> Self {
        let account_names = schema
            .instructions
            .iter()
            .map(|ix| (ix.name.clone(), ix.flattened_account_names()))
            .collect();
        Self {
            schema,
            account_names,
            codec,
        }
    }

    pub fn schema(&self) -> &ProgramSchema {
        &self.schema
    }

    pub fn codec(&self) -> &Arc<dyn InstructionCodec> {
        &self.codec
    }

    /// Flattened account role names of a declared instruction.
    pub fn account_names(&self, instruction: &str) -> Option<&[String]> {
        self.account_names.get(instruction).map(Vec::as_slice)
    }

    /// Decode `instruction` against this schema.
    pub fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        let decoded = self
            .codec
            .decode(&instruction.data)
            .ok_or(DecodeError::UnrecognizedLayout)?;
        let names = self
            .account_names(&decoded.name)
            .ok_or_else(|| DecodeError::UnknownInstruction(decoded.name.clone()))?;

        Ok(NormalizedInstruction {
            accounts: bind_accounts(&instruction.accounts, names),
            name: decoded.name,
            program_id: instruction.program_id,
            args: InstructionArgs::Decoded(decoded.args),
            parent_program_id: None,
        })
    }
}

impl std::fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.schema.name)
            .field("instructions", &self.schema.instructions.len())
            .finish()
    }
}

/// Holds one compiled schema per program id.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<Pubkey, Arc<CompiledSchema>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema, replacing any previous one for `program_id`.
    pub fn register(&mut self, program_id: Pubkey, schema: CompiledSchema) -> Arc<CompiledSchema> {
        let schema = Arc::new(schema);
        self.schemas.insert(program_id, schema.clone());
        schema
    }

    pub fn lookup(&self, program_id: &Pubkey) -> Option<&Arc<CompiledSchema>> {
        self.schemas.get(program_id)
    }

    pub fn remove(&mut self, program_id: &Pubkey) -> Option<Arc<CompiledSchema>> {
        self.schemas.remove(program_id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}
