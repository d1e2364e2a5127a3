use serde::{Deserialize, Serialize};

use crate::converters::{serde_b64, serde_b64_list};

/// A row of the accounts or accounts-ESDT index. Regular rows are keyed by
/// the encoded address; token rows by `address-token-nonceHex`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInfo {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub address: String,
    #[serde(skip_serializing_if = "is_zero_u64", default)]
    pub nonce: u64,
    pub balance: String,
    #[serde(rename = "balanceNum")]
    pub balance_num: f64,
    #[serde(rename = "token", skip_serializing_if = "String::is_empty", default)]
    pub token_name: String,
    #[serde(rename = "identifier", skip_serializing_if = "String::is_empty", default)]
    pub token_identifier: String,
    #[serde(rename = "tokenNonce", skip_serializing_if = "is_zero_u64", default)]
    pub token_nonce: u64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub properties: String,
    #[serde(
        rename = "totalBalanceWithStake",
        skip_serializing_if = "String::is_empty",
        default
    )]
    pub total_balance_with_stake: String,
    #[serde(
        rename = "totalBalanceWithStakeNum",
        skip_serializing_if = "is_zero_f64",
        default
    )]
    pub total_balance_with_stake_num: f64,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none", default)]
    pub data: Option<TokenMetaData>,
    pub timestamp: u64,
    #[serde(rename = "shardID")]
    pub shard_id: u32,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub token_type: String,
    #[serde(rename = "currentOwner", skip_serializing_if = "String::is_empty", default)]
    pub current_owner: String,

    #[serde(skip)]
    pub is_sender: bool,
    #[serde(skip)]
    pub is_smart_contract: bool,
    #[serde(skip)]
    pub is_nft_create: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMetaData {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub creator: String,
    #[serde(skip_serializing_if = "is_zero_u32", default)]
    pub royalties: u32,
    #[serde(with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub hash: Vec<u8>,
    #[serde(with = "serde_b64_list", skip_serializing_if = "Vec::is_empty", default)]
    pub uris: Vec<Vec<u8>>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
    #[serde(with = "serde_b64", skip_serializing_if = "Vec::is_empty", default)]
    pub attributes: Vec<u8>,
    #[serde(rename = "metadata", skip_serializing_if = "String::is_empty", default)]
    pub metadata: String,
    #[serde(rename = "nonEmptyURIs")]
    pub non_empty_uris: bool,
    #[serde(rename = "whiteListedStorage")]
    pub white_listed_storage: bool,
}

/// Append-only balance history row, keyed by
/// `address-token-nonceHex-timestamp`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountBalanceHistory {
    pub address: String,
    pub timestamp: u64,
    pub balance: String,
    #[serde(rename = "token", skip_serializing_if = "String::is_empty", default)]
    pub token: String,
    #[serde(rename = "identifier", skip_serializing_if = "String::is_empty", default)]
    pub identifier: String,
    #[serde(rename = "tokenNonce", skip_serializing_if = "is_zero_u64", default)]
    pub token_nonce: u64,
    #[serde(rename = "isSender", skip_serializing_if = "is_false", default)]
    pub is_sender: bool,
    #[serde(rename = "isSmartContract", skip_serializing_if = "is_false", default)]
    pub is_smart_contract: bool,
    #[serde(rename = "shardID")]
    pub shard_id: u32,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_zero_u64(value: &u64) -> bool {
    *value == 0
}

fn is_zero_u32(value: &u32) -> bool {
    *value == 0
}

fn is_zero_f64(value: &f64) -> bool {
    *value == 0.0
}
