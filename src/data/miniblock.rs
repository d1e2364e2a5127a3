use serde::{Deserialize, Serialize};

/// A miniblock document. The same hash is written once by the producing
/// shard and once by the receiving shard; `sender_block_hash` is owned by
/// the source side and `receiver_block_hash` by the destination side.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Miniblock {
    #[serde(rename = "senderShard")]
    pub sender_shard_id: u32,
    #[serde(rename = "receiverShard")]
    pub receiver_shard_id: u32,
    #[serde(rename = "senderBlockHash", skip_serializing_if = "String::is_empty", default)]
    pub sender_block_hash: String,
    #[serde(
        rename = "receiverBlockHash",
        skip_serializing_if = "String::is_empty",
        default
    )]
    pub receiver_block_hash: String,
    #[serde(rename = "type")]
    pub mb_type: String,
    #[serde(rename = "procTypeS", skip_serializing_if = "String::is_empty", default)]
    pub processing_type_on_source: String,
    #[serde(rename = "procTypeD", skip_serializing_if = "String::is_empty", default)]
    pub processing_type_on_destination: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub reserved: Vec<u8>,

    #[serde(skip)]
    pub hash: String,
}
