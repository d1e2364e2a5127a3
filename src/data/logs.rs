use serde::{Deserialize, Serialize};

use crate::converters::{serde_b64, serde_b64_list};

/// A log document, keyed by the hash of the transaction or SCR it belongs
/// to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Logs {
    pub address: String,
    pub events: Vec<EventDoc>,
    pub timestamp: u64,

    #[serde(skip)]
    pub id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDoc {
    pub address: String,
    pub identifier: String,
    #[serde(with = "serde_b64_list")]
    pub topics: Vec<Vec<u8>>,
    #[serde(with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub data: Vec<u8>,
    #[serde(
        rename = "additionalData",
        with = "serde_b64_list",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub additional_data: Vec<Vec<u8>>,
}

/// A deployed smart contract, keyed by its address. Upgrades accumulate on
/// the same document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScDeployInfo {
    #[serde(rename = "deployTxHash")]
    pub tx_hash: String,
    pub deployer: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub upgrades: Vec<ScDeployUpgrade>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScDeployUpgrade {
    #[serde(rename = "upgradeTxHash")]
    pub tx_hash: String,
    pub upgrader: String,
    pub timestamp: u64,
}

/// A delegator's position on one staking contract, keyed by
/// `hash(delegator || contract)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delegator {
    pub address: String,
    pub contract: String,
    #[serde(rename = "activeStake")]
    pub active_stake: String,
    #[serde(rename = "activeStakeNum")]
    pub active_stake_num: f64,
    pub timestamp: u64,

    #[serde(skip)]
    pub should_delete: bool,
}
