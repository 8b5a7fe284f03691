use std::sync::Arc;

use instruction_parser::{
    anchor_discriminator, normalize_idl,
    programs::{ASSOCIATED_TOKEN_PROGRAM_ID, SYSTEM_PROGRAM_ID},
    BorshInstructionCodec, CodecError, DecodeError, DecodedData, InstructionArgs,
    InstructionCodec, InstructionParser, NamedAccount, NormalizedInstruction, ParserConfig,
};
use instruction_parser_tests::{
    anchor_data, idl_dir, init_tracing, load_idl, COUNTER_PROGRAM_ID, VAULT_PROGRAM_ID,
};
use serde_json::{json, Map, Value};
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

fn counter_parser() -> InstructionParser {
    init_tracing();
    InstructionParser::new(ParserConfig::new().with_idl_dir(idl_dir()))
}

fn counter_ix(data: Vec<u8>, accounts: usize) -> Instruction {
    let metas = (0..accounts)
        .map(|i| AccountMeta::new(Pubkey::new_unique(), i == 0))
        .collect();
    Instruction {
        program_id: COUNTER_PROGRAM_ID,
        accounts: metas,
        data,
    }
}

#[test]
fn test_idl_dir_registers_both_formats() {
    let parser = counter_parser();
    assert!(parser.has_decoder(&COUNTER_PROGRAM_ID));
    assert!(parser.has_decoder(&VAULT_PROGRAM_ID));
    assert!(parser.has_decoder(&SYSTEM_PROGRAM_ID));
    assert_eq!(parser.program_name(&COUNTER_PROGRAM_ID), Some("counter"));
    assert_eq!(parser.program_name(&VAULT_PROGRAM_ID), Some("vault"));

    let counter = parser.schema(&COUNTER_PROGRAM_ID).unwrap();
    assert_eq!(counter.instructions.len(), 5);
    assert_eq!(
        counter.instruction("increment").unwrap().discriminator,
        vec![11, 18, 104, 9, 104, 174, 59, 33]
    );
    assert!(parser.schema(&SYSTEM_PROGRAM_ID).is_none());
}

#[test]
fn test_decode_counter_instructions() {
    let parser = counter_parser();

    let initialize = parser.parse_instruction(&counter_ix(anchor_data("initialize", &[]), 3));
    assert_eq!(initialize.name, "initialize");
    assert_eq!(
        initialize.account_names(),
        vec!["counter", "authority", "systemProgram"]
    );
    assert_eq!(initialize.args, InstructionArgs::Decoded(Map::new()));

    let increment = parser.parse_instruction(&counter_ix(anchor_data("increment", &[]), 2));
    assert_eq!(increment.name, "increment");
    assert_eq!(increment.account_names(), vec!["counter", "authority"]);

    let decrement = parser.parse_instruction(&counter_ix(anchor_data("decrement", &[]), 2));
    assert_eq!(decrement.name, "decrement");

    let set = parser.parse_instruction(&counter_ix(anchor_data("set", &42u64.to_le_bytes()), 2));
    assert_eq!(set.name, "set");
    assert_eq!(set.args.get("value"), Some(&json!(42)));
}

#[test]
fn test_decode_nested_accounts_and_defined_types() {
    let parser = counter_parser();

    let mut args = vec![3u8];
    args.extend_from_slice(&2u32.to_le_bytes());
    args.extend_from_slice(b"hi");
    args.push(1);
    args.extend_from_slice(&10u64.to_le_bytes());
    args.push(1);
    let ix = counter_ix(anchor_data("configure", &args), 3);

    let parsed = parser.parse_instruction(&ix);
    assert_eq!(parsed.name, "configure");
    assert_eq!(
        parsed.account_names(),
        vec!["counter", "auth.authority", "auth.delegate"]
    );
    assert_eq!(
        parsed.args.get("config"),
        Some(&json!({
            "step": 3,
            "label": "hi",
            "limit": 10,
            "mode": { "Down": {} }
        }))
    );
}

#[test]
fn test_accounts_bound_by_position() {
    let parser = counter_parser();
    let ix = counter_ix(anchor_data("increment", &[]), 4);
    let parsed = parser.parse_instruction(&ix);

    assert_eq!(
        parsed.account_names(),
        vec!["counter", "authority", "Remaining 0", "Remaining 1"]
    );
    for (named, meta) in parsed.accounts.iter().zip(&ix.accounts) {
        assert_eq!(named.meta(), *meta);
    }

    let short = parser.parse_instruction(&counter_ix(anchor_data("increment", &[]), 1));
    assert_eq!(short.account_names(), vec!["counter"]);
}

#[test]
fn test_vault_explicit_discriminators() {
    let parser = counter_parser();
    let from = Pubkey::new_unique();
    let to = Pubkey::new_unique();
    let extra = Pubkey::new_unique();

    let mut data = vec![163, 52, 200, 231, 140, 3, 69, 186];
    data.extend_from_slice(&7u64.to_le_bytes());
    let transfer = Instruction::new_with_bytes(
        VAULT_PROGRAM_ID,
        &data,
        vec![
            AccountMeta::new(from, true),
            AccountMeta::new(to, false),
            AccountMeta::new_readonly(extra, false),
        ],
    );
    let parsed = parser.parse_instruction(&transfer);
    assert_eq!(parsed.name, "transfer");
    assert_eq!(parsed.account_names(), vec!["from", "to", "Remaining 0"]);
    assert_eq!(parsed.accounts[2].pubkey, extra);
    assert_eq!(parsed.args.get("amount"), Some(&json!(7)));

    let owner = Pubkey::new_unique();
    let mut data = vec![1u8];
    data.extend_from_slice(owner.as_ref());
    data.push(0);
    let set_owner = Instruction::new_with_bytes(
        VAULT_PROGRAM_ID,
        &data,
        vec![
            AccountMeta::new(Pubkey::new_unique(), false),
            AccountMeta::new_readonly(owner, true),
        ],
    );
    let parsed = parser.parse_instruction(&set_owner);
    assert_eq!(parsed.name, "set_owner");
    assert_eq!(parsed.args.get("new_owner"), Some(&json!(owner.to_string())));
    assert_eq!(parsed.args.get("note"), Some(&Value::Null));
}

#[test]
fn test_undecodable_data_degrades_to_unknown() {
    let parser = counter_parser();

    // Unknown discriminator.
    let ix = counter_ix(vec![9; 8], 2);
    assert_eq!(parser.parse_instruction(&ix), NormalizedInstruction::unknown(&ix));

    // Truncated argument.
    let ix = counter_ix(anchor_data("set", &[1, 2]), 2);
    let parsed = parser.parse_instruction(&ix);
    assert!(parsed.is_unknown());
    assert_eq!(parsed.args, InstructionArgs::Unknown(ix.data.clone()));
    assert_eq!(parsed.accounts[0].name, None);
}

#[test]
fn test_empty_data_matches_empty_discriminator_instruction() {
    init_tracing();
    let program_id = Pubkey::new_unique();
    let mut parser = InstructionParser::default();
    parser
        .register_schema(
            program_id,
            &json!({
                "address": program_id.to_string(),
                "metadata": { "name": "beacon", "version": "0.1.0", "spec": "0.1.0" },
                "instructions": [
                    { "name": "ping", "discriminator": [], "accounts": [], "args": [] },
                    {
                        "name": "poke",
                        "discriminator": [5],
                        "accounts": [{ "name": "target", "writable": true }],
                        "args": []
                    }
                ],
                "types": []
            }),
        )
        .unwrap();

    let ix = Instruction::new_with_bytes(program_id, &[], vec![]);
    assert_eq!(
        parser.parse_instruction(&ix),
        NormalizedInstruction {
            name: "ping".to_string(),
            program_id,
            accounts: vec![],
            args: InstructionArgs::Decoded(Map::new()),
            parent_program_id: None,
        }
    );

    // The longer discriminator still wins when it matches.
    let poke = Instruction::new_with_bytes(program_id, &[5], vec![]);
    assert_eq!(parser.parse_instruction(&poke).name, "poke");
}

#[test]
fn test_empty_data_without_matching_instruction_is_unknown() {
    let parser = counter_parser();
    let ix = counter_ix(vec![], 0);

    let parsed = parser.parse_instruction(&ix);
    assert_eq!(
        parsed,
        NormalizedInstruction {
            name: "unknown".to_string(),
            program_id: COUNTER_PROGRAM_ID,
            accounts: vec![],
            args: InstructionArgs::Unknown(vec![]),
            parent_program_id: None,
        }
    );
    assert_eq!(parsed, NormalizedInstruction::unknown(&ix));
}

#[test]
fn test_empty_data_for_builtins() {
    let parser = InstructionParser::default();
    for program_id in parser.known_programs() {
        let ix = Instruction::new_with_bytes(program_id, &[], vec![]);
        let parsed = parser.parse_instruction(&ix);
        assert_eq!(parsed.program_id, program_id);
        assert!(parsed.accounts.is_empty());
        if program_id == ASSOCIATED_TOKEN_PROGRAM_ID {
            // Empty data is the original `Create` encoding.
            assert_eq!(parsed.name, "Create");
            assert_eq!(parsed.args, InstructionArgs::Decoded(Map::new()));
        } else {
            assert_eq!(parsed, NormalizedInstruction::unknown(&ix), "{program_id}");
            assert_eq!(parsed.args, InstructionArgs::Unknown(vec![]));
        }
    }
}

#[test]
fn test_codec_encode_then_decode() {
    let schema = normalize_idl(&load_idl(&COUNTER_PROGRAM_ID)).unwrap();
    let codec = BorshInstructionCodec::new(&schema);

    let args = json!({
        "config": { "step": 1, "label": "counter", "limit": null, "mode": { "Up": {} } }
    });
    let args = args.as_object().unwrap();
    let bytes = codec.encode("configure", args).unwrap();
    assert!(bytes.starts_with(&anchor_discriminator("configure")));

    let decoded = codec.decode(&bytes).unwrap();
    assert_eq!(decoded.name, "configure");
    assert_eq!(&decoded.args, args);

    assert!(matches!(
        codec.encode("withdraw", &Map::new()),
        Err(CodecError::UnknownInstruction(_))
    ));
    assert!(matches!(
        codec.encode("set", &Map::new()),
        Err(CodecError::MissingArgument(name)) if name == "value"
    ));
}

#[test]
fn test_schema_overrides_builtin() {
    init_tracing();
    let idl = json!({
        "name": "shadow",
        "instructions": [{
            "name": "ping",
            "accounts": [{ "name": "caller", "isMut": false, "isSigner": true }],
            "args": []
        }]
    });
    let parser = InstructionParser::new(ParserConfig::new().with_schema(SYSTEM_PROGRAM_ID, idl));
    assert_eq!(parser.program_name(&SYSTEM_PROGRAM_ID), Some("shadow"));

    let ping = Instruction::new_with_bytes(
        SYSTEM_PROGRAM_ID,
        &anchor_discriminator("ping"),
        vec![AccountMeta::new_readonly(Pubkey::new_unique(), true)],
    );
    let parsed = parser.parse_instruction(&ping);
    assert_eq!(parsed.name, "ping");
    assert_eq!(parsed.account_names(), vec!["caller"]);
}

#[test]
fn test_custom_decoder_precedence_and_removal() {
    init_tracing();
    let decode = |ix: &Instruction| -> Result<NormalizedInstruction, DecodeError> {
        let mut args = Map::new();
        args.insert("len".to_string(), json!(ix.data.len()));
        Ok(NormalizedInstruction {
            name: "Custom".to_string(),
            program_id: ix.program_id,
            accounts: ix
                .accounts
                .iter()
                .map(|meta| NamedAccount::named(meta, "any"))
                .collect(),
            args: InstructionArgs::Decoded(args),
            parent_program_id: None,
        })
    };

    // An IDL for the same program registered later wins over the decoder.
    let config = ParserConfig::new()
        .with_decoder(COUNTER_PROGRAM_ID, decode)
        .with_idl_dir(idl_dir());
    let mut parser = InstructionParser::new(config);
    assert_eq!(parser.program_name(&COUNTER_PROGRAM_ID), Some("counter"));

    // Setting a decoder afterwards replaces the schema.
    parser.set_custom_decoder(COUNTER_PROGRAM_ID, decode);
    assert!(parser.schema(&COUNTER_PROGRAM_ID).is_none());
    assert_eq!(parser.program_name(&COUNTER_PROGRAM_ID), Some("Custom Program"));
    let parsed = parser.parse_instruction(&counter_ix(anchor_data("increment", &[]), 1));
    assert_eq!(parsed.name, "Custom");
    assert_eq!(parsed.args.get("len"), Some(&json!(8)));
    assert_eq!(parsed.account_names(), vec!["any"]);

    parser.remove_decoder(&COUNTER_PROGRAM_ID);
    assert!(!parser.has_decoder(&COUNTER_PROGRAM_ID));
    assert!(!parser.known_programs().contains(&COUNTER_PROGRAM_ID));
    assert!(parser
        .parse_instruction(&counter_ix(anchor_data("increment", &[]), 1))
        .is_unknown());
}

#[test]
fn test_failed_registration_keeps_schema() {
    let mut parser = counter_parser();
    let bad = json!({
        "name": "broken",
        "instructions": [{
            "name": "go",
            "accounts": [],
            "args": [{ "name": "cfg", "type": { "defined": "Missing" } }]
        }]
    });
    assert!(parser.register_schema(COUNTER_PROGRAM_ID, &bad).is_err());
    assert_eq!(parser.program_name(&COUNTER_PROGRAM_ID), Some("counter"));
    let parsed = parser.parse_instruction(&counter_ix(anchor_data("increment", &[]), 2));
    assert_eq!(parsed.name, "increment");
}

/// Decodes every payload as an instruction the schema never declared.
struct UndeclaredCodec;

impl InstructionCodec for UndeclaredCodec {
    fn decode(&self, data: &[u8]) -> Option<DecodedData> {
        (!data.is_empty()).then(|| DecodedData {
            name: "mystery".to_string(),
            args: Map::new(),
        })
    }

    fn encode(&self, name: &str, _args: &Map<String, Value>) -> Result<Vec<u8>, CodecError> {
        Err(CodecError::UnknownInstruction(name.to_string()))
    }
}

#[test]
fn test_undeclared_instruction_keeps_decoded_name() {
    let mut parser = counter_parser();
    let schema = parser.schema(&COUNTER_PROGRAM_ID).unwrap().clone();
    parser.register_schema_with_codec(COUNTER_PROGRAM_ID, schema, Arc::new(UndeclaredCodec));

    let ix = counter_ix(vec![1, 2, 3], 2);
    let parsed = parser.parse_instruction(&ix);
    assert_eq!(parsed.name, "mystery");
    assert!(parsed.is_unknown());
    assert_eq!(parsed.args, InstructionArgs::Unknown(vec![1, 2, 3]));
    assert_eq!(parsed.account_names(), vec!["", ""]);

    let empty = counter_ix(vec![], 0);
    assert_eq!(parser.parse_instruction(&empty).name, "unknown");
}
