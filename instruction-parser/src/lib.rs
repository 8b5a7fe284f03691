//! # instruction-parser
//!
//! Normalizes Solana transactions into named, account-annotated instructions.
//!
//! This crate provides:
//! - A program-id keyed dispatch table of schema-backed and custom decoders
//! - Anchor IDL normalization (legacy and 0.30+) with a borsh argument codec
//! - Built-in decoders for System, SPL Token, Token 2022, Associated Token
//!   Account, Compute Budget and Stake
//! - Adapters for compiled, legacy, `jsonParsed` and raw signed transactions
//! - Table rendering and a LiteSVM logger
//!
//! | Export | Description |
//! |--------|-------------|
//! | [`InstructionParser`] | Engine: registration, dispatch, transaction parsing |
//! | [`ParserConfig`] | Initial schemas, decoders and IDL directories |
//! | [`NormalizedInstruction`] | Uniform decoded (or unknown) instruction record |
//! | [`InstructionDecoder`] | Trait for custom and built-in decoders |
//! | [`InstructionCodec`] | Trait for schema argument codecs |
//! | [`InstructionFormatter`] | Render parsed instructions as tables |
//! | [`TransactionFetcher`] | Retrieve transactions by signature |
//!
//! Instruction-level failures never surface as errors: an instruction that
//! cannot be decoded becomes a record named `"unknown"` carrying its raw
//! bytes, or named after the decoded but undeclared instruction.

pub use solana_instruction;
pub use solana_pubkey;

pub mod adapters;
pub mod binder;
pub mod codec;
pub mod config;
mod core;
pub mod dispatch;
pub mod error;
pub mod fetch;
pub mod flatten;
pub mod formatter;
#[cfg(feature = "litesvm")]
pub mod litesvm;
pub mod parser;
pub mod programs;
pub mod registry;
pub mod schema;

pub use adapters::{
    compiled::{load_lookup_table_addresses, resolve_legacy_message, CompiledTransaction},
    raw::{decode_raw_transaction, decode_transaction_dump},
    ui::{AnnotatedEntry, UiConfirmedTransaction, UiInstruction},
    ResolvedTransaction,
};
pub use binder::bind_accounts;
pub use codec::{BorshInstructionCodec, DecodedData, InstructionCodec};
pub use config::ParserConfig;
pub use crate::core::{
    InstructionArgs, InstructionDecoder, NamedAccount, NormalizedInstruction, UNKNOWN_INSTRUCTION,
};
pub use dispatch::{Decoder, DecoderTable};
pub use error::{CodecError, DecodeError, FetchError, SchemaError, TransactionError};
pub use fetch::{Commitment, FetchOptions, TransactionFetcher};
pub use flatten::{flatten_instructions, FlattenedInstruction, InnerInstructionGroup};
pub use formatter::InstructionFormatter;
#[cfg(feature = "litesvm")]
pub use crate::litesvm::{
    account_changes, capture_account_states, compiled_transaction_from_result,
    format_account_changes, AccountChange, AccountState, AccountStates, ParsingLogger,
};
pub use parser::InstructionParser;
pub use registry::{CompiledSchema, SchemaRegistry};
pub use schema::{
    anchor_discriminator, idl::normalize_idl, AccountSlotSpec, ArgType, FieldDef,
    InstructionSchema, ProgramSchema, TypeDef, TypeDefKind,
};
