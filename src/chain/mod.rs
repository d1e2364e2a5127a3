//! Input model for the blocks arriving from the observer stream: headers,
//! bodies, the per-block transaction pool, logs/events and altered accounts.

pub mod body;
pub mod event;
pub mod header;
pub mod pool;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub use body::{Body, MiniBlock, MiniBlockType, ProcessingType};
pub use event::{Event, TxLog};
pub use header::{
    EpochStart, EpochStartEconomics, EpochStartShardData, Header, MetaHeader, MiniBlockHeader,
    ScheduledAdditionalData, ShardHeader,
};
pub use pool::{
    AlteredAccount, AlteredAccountExtra, AlteredTokenData, ChainTokenMetaData, Pool, ReceiptData,
    RewardTx, Scr, Transaction, TxInfo,
};

/// Everything the observer hands over for one finalized block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveBlockData {
    pub header_hash: Vec<u8>,
    pub header: Header,
    pub body: Body,
    pub transaction_pool: Pool,
    pub altered_accounts: HashMap<String, AlteredAccount>,
    pub signers_indexes: Vec<u64>,
    pub notarized_headers_hashes: Vec<String>,
    pub header_gas_consumption: HeaderGasConsumption,
    pub is_import_db: bool,
    pub number_of_shards: u32,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderGasConsumption {
    pub gas_provided: u64,
    pub gas_refunded: u64,
    pub gas_penalized: u64,
    pub max_gas_per_block: u64,
}
