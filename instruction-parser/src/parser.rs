//! The parsing engine: dispatch, normalization and the transaction entry points.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

use serde_json::Value;
use solana_instruction::Instruction;
use solana_message::{compiled_instruction::CompiledInstruction, legacy::Message};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_transaction::versioned::VersionedTransaction;

use crate::{
    adapters::{
        compiled::{resolve_legacy_message, CompiledTransaction},
        raw::{decode_raw_transaction, decode_transaction_dump, resolve_transaction},
        ui::{AnnotatedEntry, UiConfirmedTransaction},
    },
    codec::InstructionCodec,
    config::{load_idl_dir, ParserConfig},
    core::{InstructionDecoder, NormalizedInstruction},
    dispatch::{Decoder, DecoderTable},
    error::{DecodeError, FetchError, SchemaError, TransactionError},
    fetch::{FetchOptions, TransactionFetcher},
    flatten::{flatten_with, FlattenedInstruction, InnerInstructionGroup},
    programs::builtin_decoders,
    registry::{CompiledSchema, SchemaRegistry},
    schema::{idl::normalize_idl, ProgramSchema},
};

/// Turns instructions and transactions into [`NormalizedInstruction`]s.
///
/// Holds no per-call state. Registration methods take `&mut self`; share a
/// configured parser across threads behind an `Arc` or a lock.
#[derive(Debug)]
pub struct InstructionParser {
    schemas: SchemaRegistry,
    decoders: DecoderTable,
}

impl Default for InstructionParser {
    /// Built-in decoders only.
    fn default() -> Self {
        Self::new(ParserConfig::default())
    }
}

impl InstructionParser {
    pub fn new(config: ParserConfig) -> Self {
        let ParserConfig {
            schemas,
            decoders,
            idl_dirs,
            include_builtins,
        } = config;
        let mut parser = Self {
            schemas: SchemaRegistry::new(),
            decoders: DecoderTable::new(),
        };

        // Lowest precedence first; each stage overwrites the one before.
        if include_builtins {
            for (program_id, decoder) in builtin_decoders() {
                parser.decoders.set(program_id, Decoder::Custom(decoder));
            }
        }
        for (program_id, decoder) in decoders {
            parser.decoders.set(program_id, Decoder::Custom(decoder));
        }
        for dir in &idl_dirs {
            for (program_id, idl) in load_idl_dir(dir) {
                let _ = parser.register_schema(program_id, &idl);
            }
        }
        for (program_id, idl) in &schemas {
            let _ = parser.register_schema(*program_id, idl);
        }

        tracing::debug!(programs = parser.decoders.len(), "instruction parser ready");
        parser
    }

    /// Built-ins plus everything named by the environment.
    pub fn from_env() -> Self {
        Self::new(ParserConfig::from_env())
    }

    /// Normalize a raw IDL and register it for `program_id`.
    ///
    /// On failure the previous decoder for `program_id` stays in place.
    pub fn register_schema(&mut self, program_id: Pubkey, idl: &Value) -> Result<(), SchemaError> {
        match normalize_idl(idl) {
            Ok(schema) => {
                self.register_program_schema(program_id, schema);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(program_id = %program_id, error = %err, "schema registration failed");
                Err(err)
            }
        }
    }

    pub fn register_program_schema(&mut self, program_id: Pubkey, schema: ProgramSchema) {
        self.install_schema(program_id, CompiledSchema::new(schema));
    }

    /// Register `schema` decoded through a caller-supplied codec.
    pub fn register_schema_with_codec(
        &mut self,
        program_id: Pubkey,
        schema: ProgramSchema,
        codec: Arc<dyn InstructionCodec>,
    ) {
        self.install_schema(program_id, CompiledSchema::with_codec(schema, codec));
    }

    fn install_schema(&mut self, program_id: Pubkey, schema: CompiledSchema) {
        tracing::debug!(program_id = %program_id, program = %schema.schema().name, "registered schema");
        let schema = self.schemas.register(program_id, schema);
        self.decoders.set(program_id, Decoder::Schema(schema));
    }

    /// Install `decoder` for `program_id`, replacing any schema or decoder.
    pub fn set_custom_decoder(
        &mut self,
        program_id: Pubkey,
        decoder: impl InstructionDecoder + 'static,
    ) {
        self.set_decoder(program_id, Arc::new(decoder));
    }

    pub fn set_decoder(&mut self, program_id: Pubkey, decoder: Arc<dyn InstructionDecoder>) {
        tracing::debug!(program_id = %program_id, program = decoder.program_name(), "registered decoder");
        self.schemas.remove(&program_id);
        self.decoders.set(program_id, Decoder::Custom(decoder));
    }

    /// Forget `program_id`; no-op when unknown.
    pub fn remove_decoder(&mut self, program_id: &Pubkey) {
        self.schemas.remove(program_id);
        if self.decoders.remove(program_id).is_some() {
            tracing::debug!(program_id = %program_id, "removed decoder");
        }
    }

    pub fn has_decoder(&self, program_id: &Pubkey) -> bool {
        self.decoders.has(program_id)
    }

    /// Program ids with a decoder, sorted.
    pub fn known_programs(&self) -> Vec<Pubkey> {
        self.decoders.program_ids()
    }

    pub fn program_name(&self, program_id: &Pubkey) -> Option<&str> {
        self.decoders.get(program_id).map(Decoder::program_name)
    }

    /// The schema registered for `program_id`, if it is schema-backed.
    pub fn schema(&self, program_id: &Pubkey) -> Option<&ProgramSchema> {
        self.schemas.lookup(program_id).map(|schema| schema.schema())
    }

    /// Normalize one instruction. Never fails: anything that cannot be
    /// decoded becomes an unknown record.
    pub fn parse_instruction(&self, instruction: &Instruction) -> NormalizedInstruction {
        let program_id = instruction.program_id;
        let Some(decoder) = self.decoders.get(&program_id) else {
            tracing::debug!(program_id = %program_id, "no decoder registered");
            return NormalizedInstruction::unknown(instruction);
        };

        match panic::catch_unwind(AssertUnwindSafe(|| decoder.decode(instruction))) {
            Ok(Ok(normalized)) => normalized,
            Ok(Err(DecodeError::UnknownInstruction(name))) => {
                tracing::debug!(program_id = %program_id, instruction = %name, "instruction not declared by schema");
                NormalizedInstruction::unknown_named(instruction, name)
            }
            Ok(Err(DecodeError::UnrecognizedLayout)) => {
                tracing::debug!(program_id = %program_id, "unrecognized instruction layout");
                NormalizedInstruction::unknown(instruction)
            }
            Ok(Err(err @ DecodeError::Fault(_))) => {
                tracing::warn!(program_id = %program_id, error = %err, "decoder failed");
                NormalizedInstruction::unknown(instruction)
            }
            Err(payload) => {
                tracing::warn!(
                    program_id = %program_id,
                    panic = panic_message(&*payload),
                    "decoder panicked"
                );
                NormalizedInstruction::unknown(instruction)
            }
        }
    }

    /// Normalize flattened instructions, keeping their parent attribution.
    pub fn parse_flattened(
        &self,
        instructions: Vec<FlattenedInstruction>,
    ) -> Vec<NormalizedInstruction> {
        instructions
            .into_iter()
            .map(|flat| {
                self.parse_instruction(&flat.instruction)
                    .with_parent(flat.parent_program_id)
            })
            .collect()
    }

    /// Parse a compiled transaction, resolving address-table keys.
    pub fn parse_compiled_transaction(
        &self,
        transaction: &CompiledTransaction,
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        let resolved = transaction.resolve()?;
        Ok(self.parse_flattened(resolved.flatten(include_inner)))
    }

    pub fn parse_legacy_message(
        &self,
        message: &Message,
        inner_instructions: &[InnerInstructionGroup<CompiledInstruction>],
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        let resolved = resolve_legacy_message(message, inner_instructions)?;
        Ok(self.parse_flattened(resolved.flatten(include_inner)))
    }

    /// Parse a `jsonParsed` transaction. Entries the node already parsed are
    /// passed through without consulting the dispatch table.
    pub fn parse_ui_transaction(
        &self,
        transaction: &UiConfirmedTransaction,
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        let annotated = transaction.annotate()?;
        let flattened = flatten_with(
            annotated.entries,
            annotated.inner_instructions,
            include_inner,
            AnnotatedEntry::program_id,
        );
        Ok(flattened
            .into_iter()
            .map(|flat| {
                let normalized = match flat.instruction {
                    AnnotatedEntry::Raw(instruction) => self.parse_instruction(&instruction),
                    AnnotatedEntry::Decoded(normalized) => normalized,
                };
                normalized.with_parent(flat.parent_program_id)
            })
            .collect())
    }

    /// Parse a signed transaction. Signed envelopes carry no inner instruction
    /// groups, so the output is the same for either `include_inner`.
    pub fn parse_versioned_transaction(
        &self,
        transaction: &VersionedTransaction,
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        let resolved = resolve_transaction(transaction)?;
        Ok(self.parse_flattened(resolved.flatten(include_inner)))
    }

    /// Parse bincode-encoded signed transaction bytes.
    pub fn parse_raw_transaction(
        &self,
        bytes: &[u8],
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        self.parse_versioned_transaction(&decode_raw_transaction(bytes)?, include_inner)
    }

    /// Parse a base64 transaction dump.
    pub fn parse_transaction_dump(
        &self,
        dump: &str,
        include_inner: bool,
    ) -> Result<Vec<NormalizedInstruction>, TransactionError> {
        self.parse_versioned_transaction(&decode_transaction_dump(dump)?, include_inner)
    }

    /// Fetch a transaction and parse it. `Ok(None)` when the fetcher has no
    /// transaction for `signature`.
    pub fn parse_transaction_by_signature<F: TransactionFetcher>(
        &self,
        fetcher: &F,
        signature: &Signature,
        options: &FetchOptions,
        include_inner: bool,
    ) -> Result<Option<Vec<NormalizedInstruction>>, FetchError> {
        let transaction = fetcher
            .fetch_transaction(signature, options)
            .map_err(|err| FetchError::Fetch(Box::new(err)))?;
        match transaction {
            Some(transaction) => Ok(Some(
                self.parse_compiled_transaction(&transaction, include_inner)?,
            )),
            None => {
                tracing::debug!(signature = %signature, "transaction not found");
                Ok(None)
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
