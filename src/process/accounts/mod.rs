mod serialize;

use std::{collections::HashMap, sync::Arc};

use crate::{
    address::{is_smart_contract_address, PubkeyConverter},
    chain::AlteredAccount,
    converters::{
        compute_token_identifier, nonce_hex, token_metadata::prepare_token_metadata,
        BalanceConverter,
    },
    data::{AccountBalanceHistory, AccountInfo, TokenInfo, TokensInfo},
    process::tags::TagsCount,
};

/// The regular-account side of an altered account.
#[derive(Debug, Clone)]
pub struct RegularAccount {
    pub account: AlteredAccount,
    pub is_sender: bool,
}

/// One token position of an altered account.
#[derive(Debug, Clone)]
pub struct AccountEsdt {
    pub address: String,
    pub token_identifier: String,
    pub nft_nonce: u64,
    pub balance: String,
    pub properties: String,
    pub metadata: Option<crate::chain::ChainTokenMetaData>,
    pub is_sender: bool,
    pub is_nft_create: bool,
}

pub struct AccountsProcessor {
    converter: Arc<dyn PubkeyConverter>,
    balance_converter: Arc<BalanceConverter>,
}

impl AccountsProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>, balance_converter: Arc<BalanceConverter>) -> Self {
        AccountsProcessor {
            converter,
            balance_converter,
        }
    }

    /// Splits every altered account into its regular update and its
    /// per-token updates. A receiver whose balance did not change is
    /// skipped unless the account is brand new (zero balance).
    pub fn get_accounts(
        &self,
        altered_accounts: &HashMap<String, AlteredAccount>,
    ) -> (Vec<RegularAccount>, Vec<AccountEsdt>) {
        let mut regular = Vec::new();
        let mut esdt = Vec::new();

        for account in altered_accounts.values() {
            for token in &account.tokens {
                esdt.push(AccountEsdt {
                    address: account.address.clone(),
                    token_identifier: token.identifier.clone(),
                    nft_nonce: token.nonce,
                    balance: token.balance.clone(),
                    properties: token.properties.clone(),
                    metadata: token.metadata.clone(),
                    is_sender: account.additional.is_sender,
                    is_nft_create: token.is_nft_create,
                });
            }

            let ignore_receiver = !account.additional.balance_changed
                && not_zero_balance(&account.balance)
                && !account.additional.is_sender;
            if ignore_receiver {
                continue;
            }

            regular.push(RegularAccount {
                account: account.clone(),
                is_sender: account.additional.is_sender,
            });
        }

        (regular, esdt)
    }

    pub fn prepare_regular_accounts_map(
        &self,
        timestamp: u64,
        accounts: &[RegularAccount],
        shard_id: u32,
    ) -> HashMap<String, AccountInfo> {
        let mut accounts_map = HashMap::new();
        for regular in accounts {
            let account = &regular.account;
            let balance_num = self
                .balance_converter
                .compute_balance_as_float(&account.balance);

            accounts_map.insert(
                account.address.clone(),
                AccountInfo {
                    address: account.address.clone(),
                    nonce: account.nonce,
                    balance: account.balance.clone(),
                    balance_num,
                    total_balance_with_stake: account.balance.clone(),
                    total_balance_with_stake_num: balance_num,
                    is_sender: regular.is_sender,
                    is_smart_contract: self.address_is_smart_contract(&account.address),
                    timestamp,
                    shard_id,
                    ..Default::default()
                },
            );
        }

        accounts_map
    }

    /// Prepares the accounts-ESDT rows, keyed `address-token-nonceHex`, and
    /// the token set to enrich with `type`/`currentOwner` from the store.
    pub fn prepare_accounts_map_esdt(
        &self,
        timestamp: u64,
        accounts: &[AccountEsdt],
        tags: &mut TagsCount,
        shard_id: u32,
    ) -> (HashMap<String, AccountInfo>, TokensInfo) {
        let mut accounts_map = HashMap::new();
        let mut tokens = TokensInfo::new();

        for account in accounts {
            if account.token_identifier.is_empty() {
                continue;
            }

            let metadata = account
                .metadata
                .as_ref()
                .map(|m| prepare_token_metadata(&*self.converter, m));
            if account.is_nft_create {
                if let Some(metadata) = &metadata {
                    tags.parse_tags(&metadata.tags);
                }
            }

            let info = AccountInfo {
                address: account.address.clone(),
                token_name: account.token_identifier.clone(),
                token_identifier: compute_token_identifier(
                    &account.token_identifier,
                    account.nft_nonce,
                ),
                token_nonce: account.nft_nonce,
                balance: account.balance.clone(),
                balance_num: self
                    .balance_converter
                    .compute_esdt_balance_as_float(&account.balance),
                properties: account.properties.clone(),
                is_sender: account.is_sender,
                is_smart_contract: self.address_is_smart_contract(&account.address),
                is_nft_create: account.is_nft_create,
                data: metadata,
                timestamp,
                shard_id,
                ..Default::default()
            };

            tokens.add(TokenInfo {
                token: account.token_identifier.clone(),
                identifier: info.token_identifier.clone(),
                nonce: account.nft_nonce,
                timestamp,
                ..Default::default()
            });

            let key = format!(
                "{}-{}-{}",
                account.address,
                account.token_identifier,
                nonce_hex(account.nft_nonce)
            );
            accounts_map.insert(key, info);
        }

        (accounts_map, tokens)
    }

    /// History rows are the prepared map zipped with the block timestamp.
    pub fn prepare_accounts_history(
        &self,
        timestamp: u64,
        accounts: &HashMap<String, AccountInfo>,
        shard_id: u32,
    ) -> HashMap<String, AccountBalanceHistory> {
        let mut history = HashMap::new();
        for account in accounts.values() {
            let entry = AccountBalanceHistory {
                address: account.address.clone(),
                timestamp,
                balance: account.balance.clone(),
                token: account.token_name.clone(),
                identifier: compute_token_identifier(&account.token_name, account.token_nonce),
                token_nonce: account.token_nonce,
                is_sender: account.is_sender,
                is_smart_contract: account.is_smart_contract,
                shard_id,
            };

            let key = if entry.token.is_empty() {
                format!("{}-{}", entry.address, timestamp)
            } else {
                format!(
                    "{}-{}-{}-{}",
                    entry.address,
                    entry.token,
                    nonce_hex(entry.token_nonce),
                    timestamp
                )
            };
            history.insert(key, entry);
        }

        history
    }

    fn address_is_smart_contract(&self, address: &str) -> bool {
        self.converter
            .decode(address)
            .map(|bytes| is_smart_contract_address(&bytes))
            .unwrap_or(false)
    }
}

fn not_zero_balance(balance: &str) -> bool {
    !balance.is_empty() && balance != "0"
}
