//! The document model: one serializable struct per search index, the DTOs
//! moved between sub-processors, and the byte-budgeted bulk buffers.

pub mod account;
pub mod block;
pub mod buffer;
pub mod logs;
pub mod miniblock;
pub mod token;
pub mod transaction;

pub use account::{AccountBalanceHistory, AccountInfo, TokenMetaData};
pub use block::{Block, EpochInfo, EpochStartInfo, EpochStartShardDataDoc, MiniBlocksDetails};
pub use buffer::BufferSlice;
pub use logs::{Delegator, EventDoc, Logs, ScDeployInfo, ScDeployUpgrade};
pub use miniblock::Miniblock;
pub use token::{NftDataUpdate, RoleChange, TokenInfo, TokenRolesAndProperties, TokensInfo};
pub use transaction::{
    FeeData, PreparedResults, Receipt, RefundData, ScResult, Transaction,
};

use serde::{Deserialize, Serialize};

/// Per-round statistics document; one per (shard, round).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundInfo {
    pub round: u64,
    #[serde(rename = "signersIndexes")]
    pub signers_indexes: Vec<u64>,
    #[serde(rename = "blockWasProposed")]
    pub block_was_proposed: bool,
    #[serde(rename = "shardId")]
    pub shard_id: u32,
    pub epoch: u32,
    pub timestamp: u64,
}

/// Validator public keys of one shard for one epoch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidatorsPublicKeys {
    #[serde(rename = "publicKeys")]
    pub public_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorRatingInfo {
    #[serde(rename = "publicKey")]
    pub public_key: String,
    pub rating: f32,
}
