//! Table rendering of normalized instructions.

use tabled::{settings::Style, Table, Tabled};

use crate::{core::NormalizedInstruction, parser::InstructionParser};

const UNKNOWN_PROGRAM: &str = "Unknown Program";
const MAX_ARGS_WIDTH: usize = 96;

#[derive(Tabled)]
struct InstructionRow {
    #[tabled(rename = "#")]
    index: usize,
    program: String,
    instruction: String,
    #[tabled(rename = "invoked by")]
    parent: String,
    accounts: usize,
    args: String,
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "#")]
    index: usize,
    name: String,
    pubkey: String,
    signer: bool,
    writable: bool,
}

/// Renders instruction lists with program names from a parser's dispatch table.
#[derive(Debug, Clone, Copy)]
pub struct InstructionFormatter<'a> {
    parser: &'a InstructionParser,
}

impl<'a> InstructionFormatter<'a> {
    pub fn new(parser: &'a InstructionParser) -> Self {
        Self { parser }
    }

    fn program_name(&self, program_id: &solana_pubkey::Pubkey) -> String {
        self.parser
            .program_name(program_id)
            .unwrap_or(UNKNOWN_PROGRAM)
            .to_string()
    }

    /// One row per instruction.
    pub fn format(&self, instructions: &[NormalizedInstruction]) -> String {
        let rows = instructions.iter().enumerate().map(|(index, ix)| InstructionRow {
            index,
            program: self.program_name(&ix.program_id),
            instruction: ix.name.clone(),
            parent: ix
                .parent_program_id
                .map(|parent| self.program_name(&parent))
                .unwrap_or_default(),
            accounts: ix.accounts.len(),
            args: truncate(serde_json::to_string(&ix.args).unwrap_or_default()),
        });
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }

    /// One row per account of `instruction`.
    pub fn format_accounts(&self, instruction: &NormalizedInstruction) -> String {
        let rows = instruction
            .accounts
            .iter()
            .enumerate()
            .map(|(index, account)| AccountRow {
                index,
                name: account.name.clone().unwrap_or_default(),
                pubkey: account.pubkey.to_string(),
                signer: account.is_signer,
                writable: account.is_writable,
            });
        let mut table = Table::new(rows);
        table.with(Style::rounded());
        table.to_string()
    }

    /// Summary table followed by each instruction's account table.
    pub fn format_detailed(&self, instructions: &[NormalizedInstruction]) -> String {
        let mut out = self.format(instructions);
        for (index, ix) in instructions.iter().enumerate() {
            if ix.accounts.is_empty() {
                continue;
            }
            out.push_str(&format!("\n#{index} {} accounts\n", ix.name));
            out.push_str(&self.format_accounts(ix));
        }
        out.push('\n');
        out
    }
}

fn truncate(mut text: String) -> String {
    if text.chars().count() > MAX_ARGS_WIDTH {
        let cut = text
            .char_indices()
            .nth(MAX_ARGS_WIDTH - 3)
            .map_or(text.len(), |(i, _)| i);
        text.truncate(cut);
        text.push_str("...");
    }
    text
}
