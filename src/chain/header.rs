use serde::{Deserialize, Serialize};

use crate::{
    chain::body::{MiniBlockType, ProcessingType},
    constants::METACHAIN_SHARD_ID,
};

/// A block header, either produced by a regular shard or by the metachain.
/// The two variants share the narrow accessor set the projectors need.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Header {
    Shard(ShardHeader),
    Meta(MetaHeader),
}

impl Default for Header {
    fn default() -> Self {
        Header::Shard(ShardHeader::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardHeader {
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    pub shard_id: u32,
    pub timestamp: u64,
    pub tx_count: u32,
    pub prev_hash: Vec<u8>,
    pub state_root_hash: Vec<u8>,
    pub pub_keys_bitmap: Vec<u8>,
    pub accumulated_fees: String,
    pub developer_fees: String,
    pub miniblock_headers: Vec<MiniBlockHeader>,
    pub epoch_start_flag: bool,
    pub additional_data: Option<ScheduledAdditionalData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaHeader {
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    pub timestamp: u64,
    pub tx_count: u32,
    pub prev_hash: Vec<u8>,
    pub state_root_hash: Vec<u8>,
    pub pub_keys_bitmap: Vec<u8>,
    pub accumulated_fees: String,
    pub developer_fees: String,
    pub miniblock_headers: Vec<MiniBlockHeader>,
    pub epoch_start: Option<EpochStart>,
    pub additional_data: Option<ScheduledAdditionalData>,
}

/// Per-miniblock header entry: the processed tx window and processing type
/// that drive the projection (§ transaction grouping).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniBlockHeader {
    pub hash: Vec<u8>,
    #[serde(rename = "type")]
    pub mb_type: MiniBlockType,
    pub processing_type: ProcessingType,
    pub index_of_first_tx_processed: i32,
    pub index_of_last_tx_processed: i32,
    pub sender_shard_id: u32,
    pub receiver_shard_id: u32,
    pub tx_count: u32,
    pub reserved: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduledAdditionalData {
    pub scheduled_root_hash: Vec<u8>,
    pub scheduled_accumulated_fees: String,
    pub scheduled_developer_fees: String,
    pub scheduled_gas_provided: u64,
    pub scheduled_gas_penalized: u64,
    pub scheduled_gas_refunded: u64,
}

/// Epoch-start payload carried only by metachain headers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochStart {
    pub economics: EpochStartEconomics,
    pub last_finalized_headers: Vec<EpochStartShardData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochStartEconomics {
    pub total_supply: String,
    pub total_to_distribute: String,
    pub total_newly_minted: String,
    pub rewards_per_block: String,
    pub rewards_for_protocol_sustainability: String,
    pub node_price: String,
    pub prev_epoch_start_round: u64,
    pub prev_epoch_start_hash: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EpochStartShardData {
    pub shard_id: u32,
    pub epoch: u32,
    pub round: u64,
    pub nonce: u64,
    pub header_hash: Vec<u8>,
    pub root_hash: Vec<u8>,
    pub scheduled_root_hash: Vec<u8>,
    pub first_pending_meta_block: Vec<u8>,
    pub last_finished_meta_block: Vec<u8>,
    pub pending_miniblock_headers: Vec<MiniBlockHeader>,
}

impl Header {
    pub fn nonce(&self) -> u64 {
        match self {
            Header::Shard(h) => h.nonce,
            Header::Meta(h) => h.nonce,
        }
    }

    pub fn round(&self) -> u64 {
        match self {
            Header::Shard(h) => h.round,
            Header::Meta(h) => h.round,
        }
    }

    pub fn epoch(&self) -> u32 {
        match self {
            Header::Shard(h) => h.epoch,
            Header::Meta(h) => h.epoch,
        }
    }

    pub fn shard_id(&self) -> u32 {
        match self {
            Header::Shard(h) => h.shard_id,
            Header::Meta(_) => METACHAIN_SHARD_ID,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Header::Shard(h) => h.timestamp,
            Header::Meta(h) => h.timestamp,
        }
    }

    pub fn tx_count(&self) -> u32 {
        match self {
            Header::Shard(h) => h.tx_count,
            Header::Meta(h) => h.tx_count,
        }
    }

    pub fn prev_hash(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.prev_hash,
            Header::Meta(h) => &h.prev_hash,
        }
    }

    pub fn state_root_hash(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.state_root_hash,
            Header::Meta(h) => &h.state_root_hash,
        }
    }

    pub fn pub_keys_bitmap(&self) -> &[u8] {
        match self {
            Header::Shard(h) => &h.pub_keys_bitmap,
            Header::Meta(h) => &h.pub_keys_bitmap,
        }
    }

    pub fn accumulated_fees(&self) -> &str {
        match self {
            Header::Shard(h) => &h.accumulated_fees,
            Header::Meta(h) => &h.accumulated_fees,
        }
    }

    pub fn developer_fees(&self) -> &str {
        match self {
            Header::Shard(h) => &h.developer_fees,
            Header::Meta(h) => &h.developer_fees,
        }
    }

    pub fn miniblock_headers(&self) -> &[MiniBlockHeader] {
        match self {
            Header::Shard(h) => &h.miniblock_headers,
            Header::Meta(h) => &h.miniblock_headers,
        }
    }

    pub fn is_start_of_epoch(&self) -> bool {
        match self {
            Header::Shard(h) => h.epoch_start_flag,
            Header::Meta(h) => h.epoch_start.is_some(),
        }
    }

    pub fn additional_data(&self) -> Option<&ScheduledAdditionalData> {
        match self {
            Header::Shard(h) => h.additional_data.as_ref(),
            Header::Meta(h) => h.additional_data.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_header_reports_metachain_shard() {
        let header = Header::Meta(MetaHeader::default());
        assert_eq!(header.shard_id(), METACHAIN_SHARD_ID);

        let header = Header::Shard(ShardHeader {
            shard_id: 2,
            ..Default::default()
        });
        assert_eq!(header.shard_id(), 2);
    }

    #[test]
    fn epoch_start_follows_payload_presence() {
        let header = Header::Meta(MetaHeader {
            epoch_start: Some(EpochStart::default()),
            ..Default::default()
        });
        assert!(header.is_start_of_epoch());

        let header = Header::Meta(MetaHeader::default());
        assert!(!header.is_start_of_epoch());
    }
}
