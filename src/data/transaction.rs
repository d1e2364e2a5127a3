use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{converters::serde_b64, data::logs::Logs};

/// A transaction document. The `hash`, address bytes and attached SCRs are
/// projection-time state and never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    #[serde(rename = "miniBlockHash")]
    pub mb_hash: String,
    pub nonce: u64,
    pub round: u64,
    pub value: String,
    pub receiver: String,
    pub sender: String,
    #[serde(rename = "receiverShard")]
    pub receiver_shard: u32,
    #[serde(rename = "senderShard")]
    pub sender_shard: u32,
    #[serde(rename = "gasPrice")]
    pub gas_price: u64,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
    #[serde(rename = "gasUsed")]
    pub gas_used: u64,
    pub fee: String,
    #[serde(with = "serde_b64")]
    pub data: Vec<u8>,
    pub signature: String,
    pub timestamp: u64,
    pub status: String,
    #[serde(rename = "searchOrder")]
    pub search_order: u32,
    #[serde(rename = "senderUserName", with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub sender_username: Vec<u8>,
    #[serde(rename = "receiverUserName", with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub receiver_username: Vec<u8>,
    #[serde(rename = "hasScResults", skip_serializing_if = "is_false", default)]
    pub has_scr: bool,
    #[serde(rename = "isScCall", skip_serializing_if = "is_false", default)]
    pub is_sc_call: bool,
    #[serde(rename = "hasOperations", skip_serializing_if = "is_false", default)]
    pub has_operations: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tokens: Vec<String>,
    #[serde(rename = "esdtValues", skip_serializing_if = "Vec::is_empty", default)]
    pub esdt_values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub receivers: Vec<String>,
    #[serde(rename = "receiversShardIDs", skip_serializing_if = "Vec::is_empty", default)]
    pub receivers_shard_ids: Vec<u32>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub tx_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<Logs>,

    #[serde(skip)]
    pub smart_contract_results: Vec<ScResult>,
    #[serde(skip)]
    pub receiver_address_bytes: Vec<u8>,
    #[serde(skip)]
    pub hash: String,
}

/// A smart-contract result document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScResult {
    #[serde(rename = "miniBlockHash", skip_serializing_if = "String::is_empty", default)]
    pub mb_hash: String,
    pub nonce: u64,
    #[serde(rename = "gasLimit")]
    pub gas_limit: u64,
    #[serde(rename = "gasPrice")]
    pub gas_price: u64,
    pub value: String,
    pub sender: String,
    pub receiver: String,
    #[serde(rename = "senderShard")]
    pub sender_shard: u32,
    #[serde(rename = "receiverShard")]
    pub receiver_shard: u32,
    #[serde(rename = "relayerAddr", skip_serializing_if = "String::is_empty", default)]
    pub relayer_addr: String,
    #[serde(rename = "relayedValue", skip_serializing_if = "String::is_empty", default)]
    pub relayed_value: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub code: String,
    #[serde(with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub data: Vec<u8>,
    #[serde(rename = "prevTxHash")]
    pub prev_tx_hash: String,
    #[serde(rename = "originalTxHash")]
    pub original_tx_hash: String,
    #[serde(rename = "callType")]
    pub call_type: String,
    #[serde(rename = "codeMetaData", with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub code_metadata: Vec<u8>,
    #[serde(rename = "returnMessage", skip_serializing_if = "String::is_empty", default)]
    pub return_message: String,
    pub timestamp: u64,
    #[serde(rename = "hasOperations", skip_serializing_if = "is_false", default)]
    pub has_operations: bool,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tokens: Vec<String>,
    #[serde(rename = "esdtValues", skip_serializing_if = "Vec::is_empty", default)]
    pub esdt_values: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub receivers: Vec<String>,
    #[serde(rename = "receiversShardIDs", skip_serializing_if = "Vec::is_empty", default)]
    pub receivers_shard_ids: Vec<u32>,
    #[serde(rename = "originalSender", skip_serializing_if = "String::is_empty", default)]
    pub original_sender: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub status: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub scr_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub logs: Vec<Logs>,

    #[serde(skip)]
    pub hash: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Receipt {
    pub value: String,
    pub sender: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub data: String,
    #[serde(rename = "txHash")]
    pub tx_hash: String,
    pub timestamp: u64,

    #[serde(skip)]
    pub hash: String,
}

/// Everything the transactions sub-processor hands to the write path.
#[derive(Debug, Default)]
pub struct PreparedResults {
    pub transactions: Vec<Transaction>,
    pub scrs: Vec<ScResult>,
    pub receipts: Vec<Receipt>,
    /// Status corrections for transactions owned by other shards or earlier
    /// blocks, keyed by hex tx hash.
    pub tx_hash_status: HashMap<String, String>,
    /// Refunds whose transaction is not in the current block, keyed by hex
    /// tx hash.
    pub tx_hash_refund: HashMap<String, RefundData>,
}

#[derive(Debug, Clone, Default)]
pub struct RefundData {
    pub value: String,
    pub receiver: String,
}

/// A computed fee correction ready to be written in place.
#[derive(Debug, Clone, Default)]
pub struct FeeData {
    pub fee: String,
    pub gas_used: u64,
}

fn is_false(value: &bool) -> bool {
    !*value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_value_transaction_serializes_status_only_shape() {
        let tx = Transaction {
            status: "fail".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["status"], "fail");
        // optional fields stay absent on the minimal upsert document
        assert!(json.get("hasScResults").is_none());
        assert!(json.get("tokens").is_none());
        assert!(json.get("logs").is_none());
        // mandatory fields are present even when zero-valued
        assert_eq!(json["nonce"], 0);
        assert_eq!(json["miniBlockHash"], "");
    }

    #[test]
    fn data_field_is_base64() {
        let tx = Transaction {
            data: b"ESDTNFTTransfer@aa".to_vec(),
            ..Default::default()
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "RVNEVE5GVFRyYW5zZmVyQGFh");

        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.data, b"ESDTNFTTransfer@aa");
    }

    #[test]
    fn attached_scrs_are_not_persisted() {
        let tx = Transaction {
            smart_contract_results: vec![ScResult::default()],
            hash: "aabb".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert!(json.get("smart_contract_results").is_none());
        assert!(json.get("hash").is_none());
    }
}
