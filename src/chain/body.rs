use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Body {
    pub miniblocks: Vec<MiniBlock>,
}

/// A set of transaction hashes sharing sender shard, receiver shard and type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MiniBlock {
    pub tx_hashes: Vec<Vec<u8>>,
    pub sender_shard_id: u32,
    pub receiver_shard_id: u32,
    #[serde(rename = "type")]
    pub mb_type: MiniBlockType,
    pub reserved: Vec<u8>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MiniBlockType {
    #[default]
    TxBlock,
    StateBlock,
    PeerBlock,
    SmartContractResultBlock,
    InvalidBlock,
    ReceiptBlock,
    RewardsBlock,
}

impl MiniBlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MiniBlockType::TxBlock => "TxBlock",
            MiniBlockType::StateBlock => "StateBlock",
            MiniBlockType::PeerBlock => "PeerBlock",
            MiniBlockType::SmartContractResultBlock => "SmartContractResultBlock",
            MiniBlockType::InvalidBlock => "InvalidBlock",
            MiniBlockType::ReceiptBlock => "ReceiptBlock",
            MiniBlockType::RewardsBlock => "RewardsBlock",
        }
    }
}

/// How a miniblock was handled by the block that declared it: normally, as a
/// scheduled miniblock, or already processed in a previous block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingType {
    #[default]
    Normal,
    Scheduled,
    Processed,
}

impl ProcessingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingType::Normal => "Normal",
            ProcessingType::Scheduled => "Scheduled",
            ProcessingType::Processed => "Processed",
        }
    }
}
