use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::chain::event::TxLog;

/// The per-block transaction pool. Every map is keyed by the hex-encoded
/// hash of the entry, matching the keys used throughout the projection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Pool {
    pub txs: HashMap<String, TxInfo<Transaction>>,
    pub invalid: HashMap<String, TxInfo<Transaction>>,
    pub rewards: HashMap<String, TxInfo<RewardTx>>,
    pub scrs: HashMap<String, TxInfo<Scr>>,
    pub receipts: HashMap<String, TxInfo<ReceiptData>>,
    pub logs: HashMap<String, TxLog>,
}

/// A pool entry together with the order in which it was executed inside the
/// block, used by the block projector's miniblock details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxInfo<T: Default> {
    pub tx: T,
    pub execution_order: i32,
}

impl<T: Default> TxInfo<T> {
    pub fn new(tx: T) -> Self {
        TxInfo {
            tx,
            execution_order: 0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Transaction {
    pub nonce: u64,
    pub value: String,
    pub receiver: Vec<u8>,
    pub sender: Vec<u8>,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
    pub sender_username: Vec<u8>,
    pub receiver_username: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardTx {
    pub round: u64,
    pub epoch: u32,
    pub value: String,
    pub receiver: Vec<u8>,
}

/// A smart-contract result. `original_tx_hash` roots the SCR tree at the
/// transaction that produced it, possibly in another block or shard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scr {
    pub nonce: u64,
    pub value: String,
    pub receiver: Vec<u8>,
    pub sender: Vec<u8>,
    pub relayer_addr: Vec<u8>,
    pub relayed_value: String,
    pub code: Vec<u8>,
    pub data: Vec<u8>,
    pub prev_tx_hash: Vec<u8>,
    pub original_tx_hash: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub call_type: i32,
    pub code_metadata: Vec<u8>,
    pub return_message: Vec<u8>,
    pub original_sender: Vec<u8>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptData {
    pub value: String,
    pub sender: Vec<u8>,
    pub data: Vec<u8>,
    pub tx_hash: Vec<u8>,
}

/// An account touched by the block, as reported by the observer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlteredAccount {
    pub address: String,
    pub nonce: u64,
    pub balance: String,
    pub tokens: Vec<AlteredTokenData>,
    pub additional: AlteredAccountExtra,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlteredAccountExtra {
    pub is_sender: bool,
    pub balance_changed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlteredTokenData {
    pub identifier: String,
    pub nonce: u64,
    pub balance: String,
    pub properties: String,
    pub is_nft_create: bool,
    pub metadata: Option<ChainTokenMetaData>,
}

/// Token metadata as carried on the wire (NFT create events, altered
/// accounts); converted to the document shape by the converters module.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainTokenMetaData {
    pub nonce: u64,
    pub name: Vec<u8>,
    pub creator: Vec<u8>,
    pub royalties: u32,
    pub hash: Vec<u8>,
    pub uris: Vec<Vec<u8>>,
    pub attributes: Vec<u8>,
}
