use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::data::account::{AccountInfo, TokenMetaData};

/// A row of the tokens index: a collection or a single quantified token
/// (`token-nonceHex` identifier), from issuance through burns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenInfo {
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub ticker: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub token: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub issuer: String,
    #[serde(rename = "currentOwner", skip_serializing_if = "String::is_empty", default)]
    pub current_owner: String,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty", default)]
    pub token_type: String,
    #[serde(skip_serializing_if = "is_zero", default)]
    pub nonce: u64,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub identifier: String,
    #[serde(rename = "data", skip_serializing_if = "Option::is_none", default)]
    pub data: Option<TokenMetaData>,
    pub timestamp: u64,

    #[serde(skip)]
    pub transfer_ownership: bool,
}

/// The set of tokens touched while projecting one block, with the
/// enrichment read back from the tokens index.
#[derive(Debug, Default)]
pub struct TokensInfo {
    tokens: Vec<TokenInfo>,
}

impl TokensInfo {
    pub fn new() -> Self {
        TokensInfo::default()
    }

    pub fn add(&mut self, token: TokenInfo) {
        self.tokens.push(token);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn get_all(&self) -> &[TokenInfo] {
        &self.tokens
    }

    /// The collection names to multi-get from the tokens index.
    pub fn get_all_tokens(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tokens.iter().map(|t| t.token.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// Copies `type` and `currentOwner` from a tokens-index multi-get
    /// response onto the matching entries.
    pub fn add_type_and_owner_from_response(&mut self, response: &serde_json::Value) {
        let Some(docs) = response.get("docs").and_then(|d| d.as_array()) else {
            return;
        };

        let mut by_name: HashMap<&str, (&str, &str)> = HashMap::new();
        for doc in docs {
            if doc.get("found").and_then(|f| f.as_bool()) != Some(true) {
                continue;
            }
            let Some(id) = doc.get("_id").and_then(|i| i.as_str()) else {
                continue;
            };
            let token_type = doc
                .pointer("/_source/type")
                .and_then(|t| t.as_str())
                .unwrap_or("");
            let owner = doc
                .pointer("/_source/currentOwner")
                .and_then(|o| o.as_str())
                .unwrap_or("");
            by_name.insert(id, (token_type, owner));
        }

        for token in &mut self.tokens {
            if let Some((token_type, owner)) = by_name.get(token.token.as_str()) {
                if token.token_type.is_empty() {
                    token.token_type = token_type.to_string();
                }
                if token.current_owner.is_empty() {
                    token.current_owner = owner.to_string();
                }
            }
        }
    }

    /// Stamps the resolved type and owner on prepared accounts-ESDT rows.
    pub fn put_type_and_owner_in_accounts(&self, accounts: &mut HashMap<String, AccountInfo>) {
        for account in accounts.values_mut() {
            let Some(token) = self
                .tokens
                .iter()
                .find(|t| t.token == account.token_name && !t.token_type.is_empty())
            else {
                continue;
            };
            account.token_type = token.token_type.clone();
            account.current_owner = token.current_owner.clone();
        }
    }
}

/// Role grants and revocations extracted from the block's events,
/// applied to token documents as scripted updates.
#[derive(Debug, Default)]
pub struct TokenRolesAndProperties {
    changes: Vec<RoleChange>,
}

#[derive(Debug, Clone)]
pub struct RoleChange {
    pub token: String,
    pub address: String,
    pub role: String,
    pub set: bool,
}

impl TokenRolesAndProperties {
    pub fn new() -> Self {
        TokenRolesAndProperties::default()
    }

    pub fn add_role(&mut self, token: &str, address: &str, role: &str, set: bool) {
        self.changes.push(RoleChange {
            token: token.to_string(),
            address: address.to_string(),
            role: role.to_string(),
            set,
        });
    }

    pub fn changes(&self) -> &[RoleChange] {
        &self.changes
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// An in-block NFT metadata change: URIs appended or attributes replaced.
#[derive(Debug, Clone, Default)]
pub struct NftDataUpdate {
    pub identifier: String,
    pub uris_to_add: Vec<Vec<u8>>,
    pub new_attributes: Vec<u8>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}
