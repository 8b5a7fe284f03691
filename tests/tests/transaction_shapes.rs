use std::collections::HashMap;

use base64::Engine;
use instruction_parser::{
    adapters::ui::MEMO_PROGRAM_ID, programs::SYSTEM_PROGRAM_ID, CompiledTransaction,
    FetchError, FetchOptions, InnerInstructionGroup, InstructionParser, ParserConfig,
    TransactionError, TransactionFetcher, UiConfirmedTransaction,
};
use instruction_parser_tests::{
    anchor_data, deterministic_keypair, idl_dir, init_tracing, COUNTER_PROGRAM_ID,
};
use serde_json::json;
use solana_hash::Hash;
use solana_instruction::{AccountMeta, Instruction};
use solana_message::{
    compiled_instruction::CompiledInstruction, v0, Message, VersionedMessage,
};
use solana_pubkey::Pubkey;
use solana_signature::Signature;
use solana_signer::Signer;
use solana_system_interface::instruction as system_instruction;
use solana_transaction::{versioned::VersionedTransaction, Transaction};

fn parser() -> InstructionParser {
    init_tracing();
    InstructionParser::new(ParserConfig::new().with_idl_dir(idl_dir()))
}

/// A legacy message with a system transfer and a counter increment, plus two
/// system transfers recorded as inner instructions of the first.
fn message_with_inner() -> (Message, Vec<InnerInstructionGroup<CompiledInstruction>>) {
    let payer = deterministic_keypair(1).pubkey();
    let recipient = deterministic_keypair(2).pubkey();
    let counter = deterministic_keypair(3).pubkey();

    let transfer = system_instruction::transfer(&payer, &recipient, 10);
    let increment = Instruction::new_with_bytes(
        COUNTER_PROGRAM_ID,
        &anchor_data("increment", &[]),
        vec![AccountMeta::new(counter, false), AccountMeta::new_readonly(payer, true)],
    );
    let message = Message::new(&[transfer, increment], Some(&payer));

    let index = |key: &Pubkey| -> u8 {
        message.account_keys.iter().position(|k| k == key).unwrap() as u8
    };
    let inner_transfer = |lamports: u64| {
        let mut data = 2u32.to_le_bytes().to_vec();
        data.extend_from_slice(&lamports.to_le_bytes());
        CompiledInstruction::new_from_raw_parts(
            index(&SYSTEM_PROGRAM_ID),
            data,
            vec![index(&payer), index(&recipient)],
        )
    };
    let inner = vec![InnerInstructionGroup::new(0, vec![inner_transfer(3), inner_transfer(4)])];
    (message, inner)
}

#[test]
fn test_compiled_transaction_with_inner_instructions() {
    let parser = parser();
    let (message, inner) = message_with_inner();
    let payer = message.account_keys[0];
    let tx = CompiledTransaction::new(VersionedMessage::Legacy(message))
        .with_inner_instructions(inner);

    let parsed = parser.parse_compiled_transaction(&tx, true).unwrap();
    let names: Vec<&str> = parsed.iter().map(|ix| ix.name.as_str()).collect();
    assert_eq!(names, vec!["Transfer", "Transfer", "Transfer", "increment"]);

    let lamports: Vec<_> = parsed[..3]
        .iter()
        .map(|ix| ix.args.get("lamports").cloned())
        .collect();
    assert_eq!(lamports, vec![Some(json!(10)), Some(json!(3)), Some(json!(4))]);

    assert_eq!(parsed[0].parent_program_id, None);
    assert_eq!(parsed[1].parent_program_id, Some(SYSTEM_PROGRAM_ID));
    assert_eq!(parsed[2].parent_program_id, Some(SYSTEM_PROGRAM_ID));
    assert_eq!(parsed[3].parent_program_id, None);

    // Signer and writable flags come from the message header.
    assert_eq!(parsed[1].accounts[0].pubkey, payer);
    assert!(parsed[1].accounts[0].is_signer);
    assert!(parsed[1].accounts[0].is_writable);
    assert_eq!(parsed[3].account_names(), vec!["counter", "authority"]);

    let top_level = parser.parse_compiled_transaction(&tx, false).unwrap();
    assert_eq!(top_level.len(), 2);
    assert_eq!(top_level[1].name, "increment");
}

#[test]
fn test_legacy_message_drops_orphan_inner_groups() {
    let parser = parser();
    let (message, mut inner) = message_with_inner();
    let orphan = InnerInstructionGroup::new(9, inner[0].instructions.clone());
    inner.push(orphan);

    let parsed = parser.parse_legacy_message(&message, &inner, true).unwrap();
    assert_eq!(parsed.len(), 4);
    assert_eq!(parsed[3].name, "increment");
}

#[test]
fn test_out_of_range_account_index_is_an_error() {
    let parser = parser();
    let (message, _) = message_with_inner();
    let bad = vec![InnerInstructionGroup::new(
        1,
        vec![CompiledInstruction::new_from_raw_parts(0, vec![], vec![200])],
    )];
    let err = parser.parse_legacy_message(&message, &bad, true).unwrap_err();
    assert!(matches!(
        err,
        TransactionError::AccountIndexOutOfBounds { index: 200, .. }
    ));
}

#[test]
fn test_v0_message_with_loaded_addresses() {
    let parser = parser();
    let payer = deterministic_keypair(1).pubkey();
    let table_writable = deterministic_keypair(4).pubkey();
    let table_readonly = deterministic_keypair(5).pubkey();

    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&99u64.to_le_bytes());
    // Static keys: payer, system program. Index 2 is loaded writable, 3 loaded read-only.
    let message = VersionedMessage::V0(v0::Message {
        header: solana_message::MessageHeader {
            num_required_signatures: 1,
            num_readonly_signed_accounts: 0,
            num_readonly_unsigned_accounts: 1,
        },
        account_keys: vec![payer, SYSTEM_PROGRAM_ID],
        recent_blockhash: Hash::default(),
        instructions: vec![CompiledInstruction::new_from_raw_parts(1, data, vec![0, 2, 3])],
        address_table_lookups: vec![],
    });
    let tx = CompiledTransaction::new(message).with_loaded_addresses(v0::LoadedAddresses {
        writable: vec![table_writable],
        readonly: vec![table_readonly],
    });

    let parsed = parser.parse_compiled_transaction(&tx, true).unwrap();
    assert_eq!(parsed.len(), 1);
    assert_eq!(parsed[0].name, "Transfer");
    assert_eq!(
        parsed[0].account_names(),
        vec!["from", "to", "Remaining 0"]
    );
    assert_eq!(parsed[0].accounts[1].pubkey, table_writable);
    assert!(parsed[0].accounts[1].is_writable);
    assert!(!parsed[0].accounts[2].is_writable);
}

#[test]
fn test_ui_transaction_json_parsed() {
    let parser = parser();
    let payer = deterministic_keypair(1).pubkey();
    let recipient = deterministic_keypair(2).pubkey();

    let mut data = 2u32.to_le_bytes().to_vec();
    data.extend_from_slice(&500u64.to_le_bytes());
    let tx: UiConfirmedTransaction = serde_json::from_value(json!({
        "slot": 42,
        "transaction": {
            "signatures": ["1111111111111111111111111111111111111111111111111111111111111111"],
            "message": {
                "accountKeys": [
                    { "pubkey": payer.to_string(), "writable": true, "signer": true, "source": "transaction" },
                    { "pubkey": recipient.to_string(), "writable": true, "signer": false, "source": "transaction" },
                    { "pubkey": SYSTEM_PROGRAM_ID.to_string(), "writable": false, "signer": false, "source": "transaction" },
                    { "pubkey": MEMO_PROGRAM_ID.to_string(), "writable": false, "signer": false, "source": "transaction" }
                ],
                "recentBlockhash": "11111111111111111111111111111111",
                "instructions": [
                    {
                        "programId": SYSTEM_PROGRAM_ID.to_string(),
                        "accounts": [payer.to_string(), recipient.to_string()],
                        "data": bs58::encode(&data).into_string(),
                        "stackHeight": null
                    },
                    {
                        "program": "spl-memo",
                        "programId": MEMO_PROGRAM_ID.to_string(),
                        "parsed": "gm",
                        "stackHeight": null
                    }
                ]
            }
        },
        "meta": {
            "err": null,
            "fee": 5000,
            "innerInstructions": [{
                "index": 0,
                "instructions": [{
                    "program": "system",
                    "programId": SYSTEM_PROGRAM_ID.to_string(),
                    "parsed": {
                        "type": "transfer",
                        "info": { "source": payer.to_string(), "destination": recipient.to_string(), "lamports": 1 }
                    },
                    "stackHeight": 2
                }]
            }],
            "logMessages": []
        }
    }))
    .unwrap();

    let parsed = parser.parse_ui_transaction(&tx, true).unwrap();
    let names: Vec<&str> = parsed.iter().map(|ix| ix.name.as_str()).collect();
    assert_eq!(names, vec!["Transfer", "transfer", "Memo"]);

    assert_eq!(parsed[0].args.get("lamports"), Some(&json!(500)));
    assert!(parsed[0].accounts[0].is_signer);
    assert!(!parsed[0].accounts[1].is_signer);

    assert_eq!(parsed[1].parent_program_id, Some(SYSTEM_PROGRAM_ID));
    assert_eq!(parsed[1].args.get("lamports"), Some(&json!(1)));

    assert_eq!(parsed[2].program_id, MEMO_PROGRAM_ID);
    assert_eq!(parsed[2].args.get("message"), Some(&json!("gm")));
    assert!(parsed[2].accounts.is_empty());

    let top_level = parser.parse_ui_transaction(&tx, false).unwrap();
    assert_eq!(top_level.len(), 2);
}

#[test]
fn test_raw_transaction_and_dump() {
    let parser = parser();
    let payer = deterministic_keypair(1);
    let recipient = deterministic_keypair(2).pubkey();
    let counter = deterministic_keypair(3).pubkey();

    let ixs = [
        system_instruction::transfer(&payer.pubkey(), &recipient, 77),
        Instruction::new_with_bytes(
            COUNTER_PROGRAM_ID,
            &anchor_data("set", &5u64.to_le_bytes()),
            vec![
                AccountMeta::new(counter, false),
                AccountMeta::new_readonly(payer.pubkey(), true),
            ],
        ),
    ];
    let message = Message::new(&ixs, Some(&payer.pubkey()));
    let tx = VersionedTransaction::from(Transaction::new(&[&payer], message, Hash::default()));

    let bytes = bincode::serialize(&tx).unwrap();
    let from_bytes = parser.parse_raw_transaction(&bytes, true).unwrap();
    let dump = base64::engine::general_purpose::STANDARD.encode(&bytes);
    let from_dump = parser.parse_transaction_dump(&format!("{dump}\n"), true).unwrap();
    assert_eq!(from_bytes, from_dump);
    assert_eq!(parser.parse_transaction_dump(&dump, false).unwrap(), from_dump);

    assert_eq!(from_dump.len(), 2);
    assert_eq!(from_dump[0].name, "Transfer");
    assert_eq!(from_dump[1].name, "set");
    assert_eq!(from_dump[1].args.get("value"), Some(&json!(5)));
    assert_eq!(
        from_dump[1].accounts[1].pubkey,
        payer.pubkey()
    );

    let v0_message = v0::Message::try_compile(&payer.pubkey(), &ixs, &[], Hash::default()).unwrap();
    let v0_tx = VersionedTransaction::try_new(VersionedMessage::V0(v0_message), &[&payer]).unwrap();
    let parsed = parser.parse_versioned_transaction(&v0_tx, true).unwrap();
    assert_eq!(parsed, from_dump);

    assert!(matches!(
        parser.parse_transaction_dump("not base64!", true),
        Err(TransactionError::InvalidDump(_))
    ));
    assert!(matches!(
        parser.parse_raw_transaction(&[1, 2, 3], false),
        Err(TransactionError::Deserialize(_))
    ));
}

struct MapFetcher {
    transactions: HashMap<Signature, CompiledTransaction>,
    offline: bool,
}

impl TransactionFetcher for MapFetcher {
    type Error = std::io::Error;

    fn fetch_transaction(
        &self,
        signature: &Signature,
        options: &FetchOptions,
    ) -> Result<Option<CompiledTransaction>, Self::Error> {
        assert_eq!(options.max_supported_transaction_version, Some(0));
        if self.offline {
            return Err(std::io::Error::new(std::io::ErrorKind::NotConnected, "offline"));
        }
        Ok(self.transactions.get(signature).cloned())
    }
}

#[test]
fn test_parse_by_signature() {
    let parser = parser();
    let (message, inner) = message_with_inner();
    let signature = Signature::from([7u8; 64]);
    let mut fetcher = MapFetcher {
        transactions: HashMap::from([(
            signature,
            CompiledTransaction::new(VersionedMessage::Legacy(message))
                .with_inner_instructions(inner),
        )]),
        offline: false,
    };
    let options = FetchOptions::default();

    let parsed = parser
        .parse_transaction_by_signature(&fetcher, &signature, &options, true)
        .unwrap()
        .unwrap();
    assert_eq!(parsed.len(), 4);

    let missing = Signature::from([8u8; 64]);
    assert!(parser
        .parse_transaction_by_signature(&fetcher, &missing, &options, true)
        .unwrap()
        .is_none());

    fetcher.offline = true;
    assert!(matches!(
        parser.parse_transaction_by_signature(&fetcher, &signature, &options, true),
        Err(FetchError::Fetch(_))
    ));
}
