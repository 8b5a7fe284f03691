//! Parser construction options.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};

use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::{core::InstructionDecoder, error::SchemaError};

/// Directory of `<programId>.json` IDL files.
pub const IDL_DIR_ENV: &str = "INSTRUCTION_PARSER_IDL_DIR";
/// Set to `1` or `true` to start without the built-in decoders.
pub const DISABLE_BUILTINS_ENV: &str = "INSTRUCTION_PARSER_DISABLE_BUILTINS";

/// Initial schema and decoder set for an [`crate::InstructionParser`].
///
/// Precedence when the same program id appears more than once: schemas
/// (including IDL directories) over custom decoders over built-ins.
#[derive(Clone)]
pub struct ParserConfig {
    pub schemas: Vec<(Pubkey, Value)>,
    pub decoders: Vec<(Pubkey, Arc<dyn InstructionDecoder>)>,
    pub idl_dirs: Vec<PathBuf>,
    pub include_builtins: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            schemas: Vec::new(),
            decoders: Vec::new(),
            idl_dirs: Vec::new(),
            include_builtins: true,
        }
    }
}

impl fmt::Debug for ParserConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserConfig")
            .field(
                "schemas",
                &self.schemas.iter().map(|(id, _)| id).collect::<Vec<_>>(),
            )
            .field(
                "decoders",
                &self
                    .decoders
                    .iter()
                    .map(|(id, decoder)| (id, decoder.program_name()))
                    .collect::<Vec<_>>(),
            )
            .field("idl_dirs", &self.idl_dirs)
            .field("include_builtins", &self.include_builtins)
            .finish()
    }
}

impl ParserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `INSTRUCTION_PARSER_IDL_DIR` and `INSTRUCTION_PARSER_DISABLE_BUILTINS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = std::env::var(IDL_DIR_ENV) {
            if !dir.is_empty() {
                config = config.with_idl_dir(dir);
            }
        }
        if let Ok(value) = std::env::var(DISABLE_BUILTINS_ENV) {
            if value == "1" || value.eq_ignore_ascii_case("true") {
                config = config.without_builtins();
            }
        }
        config
    }

    /// Register a raw IDL for `program_id`. Later entries override earlier ones.
    pub fn with_schema(mut self, program_id: Pubkey, idl: Value) -> Self {
        self.schemas.push((program_id, idl));
        self
    }

    pub fn with_decoder(
        mut self,
        program_id: Pubkey,
        decoder: impl InstructionDecoder + 'static,
    ) -> Self {
        self.decoders.push((program_id, Arc::new(decoder)));
        self
    }

    /// Load every `<programId>.json` in `dir` at construction time.
    pub fn with_idl_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.idl_dirs.push(dir.into());
        self
    }

    pub fn without_builtins(mut self) -> Self {
        self.include_builtins = false;
        self
    }
}

/// Read the IDL files of `dir`. Unreadable entries are logged and skipped.
pub(crate) fn load_idl_dir(dir: &Path) -> Vec<(Pubkey, Value)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "cannot read IDL directory");
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    paths
        .into_iter()
        .filter_map(|path| match load_idl_file(&path) {
            Ok(loaded) => Some(loaded),
            Err(err) => {
                tracing::warn!(error = %err, "skipping IDL file");
                None
            }
        })
        .collect()
}

fn load_idl_file(path: &Path) -> Result<(Pubkey, Value), SchemaError> {
    let file_error = |reason: String| SchemaError::File {
        path: path.display().to_string(),
        reason,
    };
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| file_error("file name is not UTF-8".to_string()))?;
    let program_id = Pubkey::from_str(stem)
        .map_err(|_| file_error(format!("`{stem}` is not a program id")))?;
    let contents = fs::read_to_string(path).map_err(|err| file_error(err.to_string()))?;
    let idl = serde_json::from_str(&contents)?;
    Ok((program_id, idl))
}
