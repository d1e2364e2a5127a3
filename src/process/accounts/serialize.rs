use std::collections::HashMap;

use crate::{
    converters::{
        json_escape,
        token_metadata::{extract_metadata_from_attributes, extract_tags_from_attributes},
    },
    data::{AccountBalanceHistory, AccountInfo, BufferSlice, NftDataUpdate},
};

use super::AccountsProcessor;

impl AccountsProcessor {
    pub fn serialize_accounts(
        &self,
        accounts: &HashMap<String, AccountInfo>,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for (address, account) in accounts {
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(address)
            );
            buffer.put_data(&meta, &serde_json::to_string(account)?);
        }
        Ok(())
    }

    /// Serializes the accounts-ESDT rows. A zeroed balance deletes the row;
    /// in-block NFT metadata updates are folded in before writing.
    pub fn serialize_accounts_esdt(
        &self,
        accounts: &HashMap<String, AccountInfo>,
        updates: &[NftDataUpdate],
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for (key, account) in accounts {
            let mut account = account.clone();
            merge_nft_updates(&mut account, updates);

            if account.balance == "0" {
                let meta = format!(
                    r#"{{ "delete" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                    index,
                    json_escape(key)
                );
                buffer.put_meta(&meta);
                continue;
            }

            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(key)
            );
            buffer.put_data(&meta, &serde_json::to_string(&account)?);
        }
        Ok(())
    }

    pub fn serialize_accounts_history(
        &self,
        history: &HashMap<String, AccountBalanceHistory>,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for (key, row) in history {
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(key)
            );
            buffer.put_data(&meta, &serde_json::to_string(row)?);
        }
        Ok(())
    }
}

fn merge_nft_updates(account: &mut AccountInfo, updates: &[NftDataUpdate]) {
    let Some(data) = &mut account.data else {
        return;
    };

    for update in updates {
        if update.identifier != account.token_identifier {
            continue;
        }

        data.uris.extend(update.uris_to_add.iter().cloned());
        if !update.new_attributes.is_empty() {
            data.attributes = update.new_attributes.clone();
            let tags = extract_tags_from_attributes(&update.new_attributes);
            if !tags.is_empty() {
                data.tags = tags;
            }
            let metadata = extract_metadata_from_attributes(&update.new_attributes);
            if !metadata.is_empty() {
                data.metadata = metadata;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        address::HexPubkeyConverter,
        converters::BalanceConverter,
        data::account::TokenMetaData,
    };

    fn processor() -> AccountsProcessor {
        AccountsProcessor::new(
            Arc::new(HexPubkeyConverter::new(3, "")),
            Arc::new(BalanceConverter::new(18)),
        )
    }

    #[test]
    fn zero_balance_row_becomes_a_delete() {
        let mut accounts = HashMap::new();
        accounts.insert(
            "addr-NFT-abcdef-718863".to_string(),
            AccountInfo {
                balance: "0".to_string(),
                ..Default::default()
            },
        );
        accounts.insert(
            "other-NFT-abcdef-718863".to_string(),
            AccountInfo {
                balance: "1000".to_string(),
                ..Default::default()
            },
        );

        let mut buffer = BufferSlice::new(1 << 20);
        processor()
            .serialize_accounts_esdt(&accounts, &[], &mut buffer, "accountsesdt")
            .unwrap();

        let content = buffer.buffers().join("");
        assert!(content.contains(r#""delete" : { "_index":"accountsesdt", "_id" : "addr-NFT-abcdef-718863" }"#));
        assert!(content.contains(r#""index" : { "_index":"accountsesdt", "_id" : "other-NFT-abcdef-718863" }"#));
    }

    #[test]
    fn nft_updates_merge_into_account_data() {
        let mut account = AccountInfo {
            token_identifier: "NFT-abcd-0e".to_string(),
            balance: "1".to_string(),
            data: Some(TokenMetaData {
                uris: vec![b"uri".to_vec()],
                ..Default::default()
            }),
            ..Default::default()
        };

        merge_nft_updates(
            &mut account,
            &[NftDataUpdate {
                identifier: "NFT-abcd-0e".to_string(),
                uris_to_add: vec![b"uri1".to_vec()],
                new_attributes: b"tags:fun;metadata:meta-x".to_vec(),
            }],
        );

        let data = account.data.unwrap();
        assert_eq!(data.uris.len(), 2);
        assert_eq!(data.tags, vec!["fun"]);
        assert_eq!(data.metadata, "meta-x");
    }
}
