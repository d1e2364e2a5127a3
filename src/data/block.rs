use serde::{Deserialize, Serialize};

/// A block document, keyed by the header hash.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Block {
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    #[serde(rename = "shardId")]
    pub shard_id: u32,
    #[serde(rename = "miniBlocksHashes", skip_serializing_if = "Vec::is_empty", default)]
    pub miniblocks_hashes: Vec<String>,
    #[serde(rename = "notarizedBlocksHashes")]
    pub notarized_blocks_hashes: Vec<String>,
    pub proposer: u64,
    pub validators: Vec<u64>,
    #[serde(rename = "pubKeyBitmap")]
    pub pub_key_bitmap: String,
    pub size: i64,
    #[serde(rename = "sizeTxs")]
    pub size_txs: i64,
    pub timestamp: u64,
    #[serde(rename = "stateRootHash")]
    pub state_root_hash: String,
    #[serde(rename = "prevHash")]
    pub prev_hash: String,
    #[serde(rename = "txCount")]
    pub tx_count: u32,
    #[serde(rename = "notarizedTxsCount")]
    pub notarized_txs_count: u32,
    #[serde(rename = "accumulatedFees")]
    pub accumulated_fees: String,
    #[serde(rename = "developerFees")]
    pub developer_fees: String,
    #[serde(rename = "epochStartBlock")]
    pub epoch_start_block: bool,
    #[serde(rename = "searchOrder")]
    pub search_order: u64,
    #[serde(rename = "gasProvided")]
    pub gas_provided: u64,
    #[serde(rename = "gasRefunded")]
    pub gas_refunded: u64,
    #[serde(rename = "gasPenalized")]
    pub gas_penalized: u64,
    #[serde(rename = "maxGasLimit")]
    pub max_gas_limit: u64,
    #[serde(rename = "scheduledData", skip_serializing_if = "Option::is_none", default)]
    pub scheduled_data: Option<ScheduledDataDoc>,
    #[serde(rename = "epochStartInfo", skip_serializing_if = "Option::is_none", default)]
    pub epoch_start_info: Option<EpochStartInfo>,
    #[serde(
        rename = "epochStartShardsData",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub epoch_start_shards_data: Vec<EpochStartShardDataDoc>,
    #[serde(
        rename = "miniBlocksDetails",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub miniblocks_details: Vec<MiniBlocksDetails>,

    #[serde(skip)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduledDataDoc {
    #[serde(rename = "rootHash")]
    pub scheduled_root_hash: String,
    #[serde(rename = "accumulatedFees")]
    pub scheduled_accumulated_fees: String,
    #[serde(rename = "developerFees")]
    pub scheduled_developer_fees: String,
    #[serde(rename = "gasProvided")]
    pub scheduled_gas_provided: u64,
    #[serde(rename = "gasPenalized")]
    pub scheduled_gas_penalized: u64,
    #[serde(rename = "gasRefunded")]
    pub scheduled_gas_refunded: u64,
}

/// Economics carried by an epoch-start metachain block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochStartInfo {
    #[serde(rename = "totalSupply")]
    pub total_supply: String,
    #[serde(rename = "totalToDistribute")]
    pub total_to_distribute: String,
    #[serde(rename = "totalNewlyMinted")]
    pub total_newly_minted: String,
    #[serde(rename = "rewardsPerBlock")]
    pub rewards_per_block: String,
    #[serde(rename = "rewardsForProtocolSustainability")]
    pub rewards_for_protocol_sustainability: String,
    #[serde(rename = "nodePrice")]
    pub node_price: String,
    #[serde(rename = "prevEpochStartRound")]
    pub prev_epoch_start_round: u64,
    #[serde(rename = "prevEpochStartHash")]
    pub prev_epoch_start_hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochStartShardDataDoc {
    #[serde(rename = "shardID")]
    pub shard_id: u32,
    pub epoch: u32,
    pub round: u64,
    pub nonce: u64,
    #[serde(rename = "headerHash")]
    pub header_hash: String,
    #[serde(rename = "rootHash")]
    pub root_hash: String,
    #[serde(rename = "scheduledRootHash")]
    pub scheduled_root_hash: String,
    #[serde(rename = "firstPendingMetaBlock")]
    pub first_pending_meta_block: String,
    #[serde(rename = "lastFinishedMetaBlock")]
    pub last_finished_meta_block: String,
    #[serde(
        rename = "pendingMiniBlockHeaders",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub pending_miniblock_headers: Vec<super::miniblock::Miniblock>,
}

/// Per-miniblock execution details recorded on the block document. Indices
/// outside the processed window carry -1; hashes missing from the pool -2.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiniBlocksDetails {
    #[serde(rename = "firstProcessedTx")]
    pub index_first_processed_tx: i32,
    #[serde(rename = "lastProcessedTx")]
    pub index_last_processed_tx: i32,
    #[serde(rename = "mbIndex")]
    pub mb_index: usize,
    #[serde(rename = "type")]
    pub mb_type: String,
    #[serde(rename = "procType")]
    pub processing_type: String,
    #[serde(rename = "senderShard")]
    pub sender_shard: u32,
    #[serde(rename = "receiverShard")]
    pub receiver_shard: u32,
    #[serde(rename = "txsHashes")]
    pub txs_hashes: Vec<String>,
    #[serde(rename = "executionOrderTxsIndices")]
    pub execution_order_txs_indices: Vec<i32>,
}

/// Per-epoch fee totals, written by metachain observers into its own index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpochInfo {
    #[serde(rename = "accumulatedFees")]
    pub accumulated_fees: String,
    #[serde(rename = "developerFees")]
    pub developer_fees: String,
}
