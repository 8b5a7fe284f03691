//! Stake program decoder.
//!
//! Instruction data is the bincode encoding of [`StakeInstruction`].

use serde_json::{json, Value};
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use solana_stake_interface::{instruction::StakeInstruction, state::StakeAuthorize};

use super::{decoded, limited_deserialize};
use crate::{
    core::{InstructionDecoder, NormalizedInstruction},
    error::DecodeError,
};

pub const STAKE_PROGRAM_ID: Pubkey =
    solana_pubkey::pubkey!("Stake11111111111111111111111111111111111111");

#[derive(Debug, Default, Clone, Copy)]
pub struct StakeInstructionDecoder;

fn stake_authorize(authorize: StakeAuthorize) -> &'static str {
    match authorize {
        StakeAuthorize::Staker => "Staker",
        StakeAuthorize::Withdrawer => "Withdrawer",
    }
}

fn optional<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or(Value::Null, Into::into)
}

impl InstructionDecoder for StakeInstructionDecoder {
    fn program_name(&self) -> &str {
        "Stake Program"
    }

    fn decode(&self, instruction: &Instruction) -> Result<NormalizedInstruction, DecodeError> {
        let (name, accounts, args): (&str, &[&str], _) =
            match limited_deserialize::<StakeInstruction>(&instruction.data)? {
                StakeInstruction::Initialize(authorized, lockup) => (
                    "Initialize",
                    &["stakeAccount", "rentSysvar"],
                    json!({
                        "authorized": {
                            "staker": authorized.staker.to_string(),
                            "withdrawer": authorized.withdrawer.to_string(),
                        },
                        "lockup": {
                            "unixTimestamp": lockup.unix_timestamp,
                            "epoch": lockup.epoch,
                            "custodian": lockup.custodian.to_string(),
                        },
                    }),
                ),
                StakeInstruction::Authorize(new_authority, authorize) => (
                    "Authorize",
                    &["stakeAccount", "clockSysvar", "authority", "custodian"],
                    json!({
                        "newAuthority": new_authority.to_string(),
                        "stakeAuthorize": stake_authorize(authorize),
                    }),
                ),
                StakeInstruction::DelegateStake => (
                    "DelegateStake",
                    &[
                        "stakeAccount",
                        "voteAccount",
                        "clockSysvar",
                        "stakeHistorySysvar",
                        "stakeConfig",
                        "stakeAuthority",
                    ],
                    json!({}),
                ),
                StakeInstruction::Split(lamports) => (
                    "Split",
                    &["stakeAccount", "splitStakeAccount", "stakeAuthority"],
                    json!({ "lamports": lamports }),
                ),
                StakeInstruction::Withdraw(lamports) => (
                    "Withdraw",
                    &[
                        "stakeAccount",
                        "recipient",
                        "clockSysvar",
                        "stakeHistorySysvar",
                        "withdrawAuthority",
                        "custodian",
                    ],
                    json!({ "lamports": lamports }),
                ),
                StakeInstruction::Deactivate => (
                    "Deactivate",
                    &["stakeAccount", "clockSysvar", "stakeAuthority"],
                    json!({}),
                ),
                StakeInstruction::SetLockup(lockup) => (
                    "SetLockup",
                    &["stakeAccount", "lockupAuthority"],
                    json!({
                        "unixTimestamp": optional(lockup.unix_timestamp),
                        "epoch": optional(lockup.epoch),
                        "custodian": optional(lockup.custodian.map(|key| key.to_string())),
                    }),
                ),
                StakeInstruction::Merge => (
                    "Merge",
                    &[
                        "destinationStakeAccount",
                        "sourceStakeAccount",
                        "clockSysvar",
                        "stakeHistorySysvar",
                        "stakeAuthority",
                    ],
                    json!({}),
                ),
                StakeInstruction::AuthorizeWithSeed(seeded) => (
                    "AuthorizeWithSeed",
                    &["stakeAccount", "authorityBase", "clockSysvar", "custodian"],
                    json!({
                        "newAuthority": seeded.new_authorized_pubkey.to_string(),
                        "stakeAuthorize": stake_authorize(seeded.stake_authorize),
                        "authoritySeed": seeded.authority_seed,
                        "authorityOwner": seeded.authority_owner.to_string(),
                    }),
                ),
                StakeInstruction::InitializeChecked => (
                    "InitializeChecked",
                    &["stakeAccount", "rentSysvar", "stakeAuthority", "withdrawAuthority"],
                    json!({}),
                ),
                StakeInstruction::AuthorizeChecked(authorize) => (
                    "AuthorizeChecked",
                    &["stakeAccount", "clockSysvar", "authority", "newAuthority", "custodian"],
                    json!({ "stakeAuthorize": stake_authorize(authorize) }),
                ),
                StakeInstruction::AuthorizeCheckedWithSeed(seeded) => (
                    "AuthorizeCheckedWithSeed",
                    &[
                        "stakeAccount",
                        "authorityBase",
                        "clockSysvar",
                        "newAuthority",
                        "custodian",
                    ],
                    json!({
                        "stakeAuthorize": stake_authorize(seeded.stake_authorize),
                        "authoritySeed": seeded.authority_seed,
                        "authorityOwner": seeded.authority_owner.to_string(),
                    }),
                ),
                StakeInstruction::SetLockupChecked(lockup) => (
                    "SetLockupChecked",
                    &["stakeAccount", "lockupAuthority", "newLockupAuthority"],
                    json!({
                        "unixTimestamp": optional(lockup.unix_timestamp),
                        "epoch": optional(lockup.epoch),
                    }),
                ),
                StakeInstruction::GetMinimumDelegation => ("GetMinimumDelegation", &[], json!({})),
                StakeInstruction::DeactivateDelinquent => (
                    "DeactivateDelinquent",
                    &["stakeAccount", "delinquentVoteAccount", "referenceVoteAccount"],
                    json!({}),
                ),
                StakeInstruction::MoveStake(lamports) => (
                    "MoveStake",
                    &["sourceStakeAccount", "destinationStakeAccount", "stakeAuthority"],
                    json!({ "lamports": lamports }),
                ),
                StakeInstruction::MoveLamports(lamports) => (
                    "MoveLamports",
                    &["sourceStakeAccount", "destinationStakeAccount", "stakeAuthority"],
                    json!({ "lamports": lamports }),
                ),
                // Retired variants such as `Redelegate`.
                #[allow(unreachable_patterns)]
                _ => return Err(DecodeError::UnrecognizedLayout),
            };
        Ok(decoded(instruction, name, accounts, args))
    }
}
