use std::collections::HashMap;

use serde_json::json;

use crate::{
    converters::{
        json_escape,
        token_metadata::{extract_metadata_from_attributes, extract_tags_from_attributes},
    },
    data::{BufferSlice, Delegator, Logs, NftDataUpdate, ScDeployInfo, TokenInfo, TokenRolesAndProperties, TokensInfo},
};

use super::LogsAndEventsProcessor;

impl LogsAndEventsProcessor {
    pub fn serialize_logs(
        &self,
        logs: &[Logs],
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for log in logs {
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&log.id)
            );
            buffer.put_data(&meta, &serde_json::to_string(log)?);
        }
        Ok(())
    }

    /// Deploy documents upsert on the contract address; upgrades append to
    /// the existing document's history.
    pub fn serialize_sc_deploys(
        &self,
        deploys: &HashMap<String, ScDeployInfo>,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for (address, info) in deploys {
            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(address)
            );

            let payload = if info.upgrades.is_empty() {
                json!({"doc": info, "doc_as_upsert": true})
            } else {
                json!({
                    "script": {
                        "source": "if (ctx._source.upgrades == null) { ctx._source.upgrades = params.upgrades } else { ctx._source.upgrades.addAll(params.upgrades) }",
                        "lang": "painless",
                        "params": {"upgrades": info.upgrades}
                    },
                    "upsert": info
                })
            };
            buffer.put_data(&meta, &payload.to_string());
        }
        Ok(())
    }

    pub fn serialize_delegators(
        &self,
        delegators: &HashMap<String, Delegator>,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for (key, delegator) in delegators {
            if delegator.should_delete {
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
            buffer.put_data(&meta, &serde_json::to_string(delegator)?);
        }
        Ok(())
    }

    /// Issued tokens are plain inserts; ownership transfers only overwrite
    /// the `currentOwner` of whatever document is already there.
    pub fn serialize_tokens(
        &self,
        tokens_info: &[TokenInfo],
        updates: &[NftDataUpdate],
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for token in tokens_info {
            if token.transfer_ownership {
                let meta = format!(
                    r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                    index,
                    json_escape(&token.token)
                );
                let payload = json!({
                    "script": {
                        "source": "ctx._source.currentOwner = params.owner",
                        "lang": "painless",
                        "params": {"owner": token.current_owner}
                    },
                    "upsert": token
                });
                buffer.put_data(&meta, &payload.to_string());
                continue;
            }

            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&token.token)
            );
            buffer.put_data(&meta, &serde_json::to_string(token)?);
        }

        self.serialize_nft_data_updates(updates, buffer, index);
        Ok(())
    }

    /// NFT metadata changes as scripted updates: URIs append (skipping ones
    /// already present), attributes replace along with re-extracted tags
    /// and metadata.
    pub fn serialize_nft_data_updates(
        &self,
        updates: &[NftDataUpdate],
        buffer: &mut BufferSlice,
        index: &str,
    ) {
        for update in updates {
            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&update.identifier)
            );

            let uris: Vec<String> = update
                .uris_to_add
                .iter()
                .map(|uri| {
                    use base64::{engine::general_purpose::STANDARD, Engine};
                    STANDARD.encode(uri)
                })
                .collect();
            let tags = extract_tags_from_attributes(&update.new_attributes);
            let metadata = extract_metadata_from_attributes(&update.new_attributes);

            let payload = json!({
                "script": {
                    "source": "if (ctx._source.data == null) { ctx._source.data = new HashMap() } \
                               if (!params.uris.isEmpty()) { \
                                   if (ctx._source.data.uris == null) { ctx._source.data.uris = new ArrayList() } \
                                   for (def uri : params.uris) { if (!ctx._source.data.uris.contains(uri)) { ctx._source.data.uris.add(uri) } } \
                               } \
                               if (params.attributes != null) { ctx._source.data.attributes = params.attributes } \
                               if (params.tags != null) { ctx._source.data.tags = params.tags } \
                               if (params.metadata != null) { ctx._source.data.metadata = params.metadata }",
                    "lang": "painless",
                    "params": {
                        "uris": uris,
                        "attributes": encode_optional_bytes(&update.new_attributes),
                        "tags": if tags.is_empty() { serde_json::Value::Null } else { json!(tags) },
                        "metadata": if metadata.is_empty() { serde_json::Value::Null } else { json!(metadata) }
                    }
                }
            });
            buffer.put_data(&meta, &payload.to_string());
        }
    }

    /// Created tokens land as full documents keyed by their identifier.
    pub fn serialize_nft_create_info(
        &self,
        tokens: &TokensInfo,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for token in tokens.get_all() {
            if token.data.is_none() {
                continue;
            }
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&token.identifier)
            );
            buffer.put_data(&meta, &serde_json::to_string(token)?);
        }
        Ok(())
    }

    /// Burned or wiped quantified tokens disappear from the tokens index.
    pub fn serialize_supply_data(
        &self,
        tokens_supply: &TokensInfo,
        buffer: &mut BufferSlice,
        index: &str,
    ) {
        for token in tokens_supply.get_all() {
            if token.nonce == 0 {
                continue;
            }
            let meta = format!(
                r#"{{ "delete" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&token.identifier)
            );
            buffer.put_meta(&meta);
        }
    }

    /// Role changes: set appends the address under `roles.<role>`, unset
    /// removes it.
    pub fn serialize_roles_data(
        &self,
        roles: &TokenRolesAndProperties,
        buffer: &mut BufferSlice,
        index: &str,
    ) {
        for change in roles.changes() {
            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&change.token)
            );

            let payload = if change.set {
                let mut role_entry = serde_json::Map::new();
                role_entry.insert(change.role.clone(), json!([change.address]));
                json!({
                    "script": {
                        "source": "if (ctx._source.roles == null) { ctx._source.roles = new HashMap() } \
                                   if (!ctx._source.roles.containsKey(params.role)) { ctx._source.roles.put(params.role, new ArrayList()) } \
                                   if (!ctx._source.roles.get(params.role).contains(params.address)) { ctx._source.roles.get(params.role).add(params.address) }",
                        "lang": "painless",
                        "params": {"role": change.role, "address": change.address}
                    },
                    "upsert": {"roles": role_entry}
                })
            } else {
                json!({
                    "script": {
                        "source": "if (ctx._source.roles != null && ctx._source.roles.containsKey(params.role)) { ctx._source.roles.get(params.role).removeIf(addr -> addr == params.address) }",
                        "lang": "painless",
                        "params": {"role": change.role, "address": change.address}
                    },
                    "upsert": {"roles": {}}
                })
            };
            buffer.put_data(&meta, &payload.to_string());
        }
    }
}

fn encode_optional_bytes(bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        use base64::{engine::general_purpose::STANDARD, Engine};
        json!(STANDARD.encode(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::logs_processor;
    use super::*;
    use crate::data::BufferSlice;
    use crate::data::account::TokenMetaData;

    #[test]
    fn role_set_and_unset_produce_scripted_updates() {
        let processor = logs_processor();
        let mut roles = TokenRolesAndProperties::new();
        roles.add_role("TOK-abcd", "addr1", "ESDTRoleNFTCreate", true);
        roles.add_role("TOK-abcd", "addr1", "ESDTRoleNFTBurn", false);

        let mut buffer = BufferSlice::new(1 << 20);
        processor.serialize_roles_data(&roles, &mut buffer, "tokens");

        let content = buffer.buffers().join("");
        assert!(content.contains(r#""_id" : "TOK-abcd""#));
        assert!(content.contains("roles.put(params.role, new ArrayList())"));
        assert!(content.contains("removeIf"));
    }

    #[test]
    fn burned_nft_is_deleted_from_tokens() {
        let processor = logs_processor();
        let mut supply = TokensInfo::new();
        supply.add(TokenInfo {
            token: "NFT-abcd".to_string(),
            identifier: "NFT-abcd-0e".to_string(),
            nonce: 14,
            ..Default::default()
        });
        supply.add(TokenInfo {
            token: "FUNG-1111".to_string(),
            identifier: "FUNG-1111".to_string(),
            nonce: 0,
            ..Default::default()
        });

        let mut buffer = BufferSlice::new(1 << 20);
        processor.serialize_supply_data(&supply, &mut buffer, "tokens");

        let content = buffer.buffers().join("");
        assert!(content.contains(r#""delete" : { "_index":"tokens", "_id" : "NFT-abcd-0e" }"#));
        assert!(!content.contains("FUNG-1111"));
    }

    #[test]
    fn nft_create_info_serializes_documents_with_data() {
        let processor = logs_processor();
        let mut tokens = TokensInfo::new();
        tokens.add(TokenInfo {
            token: "NFT-abcd".to_string(),
            identifier: "NFT-abcd-0e".to_string(),
            nonce: 14,
            data: Some(TokenMetaData {
                name: "nifty".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        });

        let mut buffer = BufferSlice::new(1 << 20);
        processor
            .serialize_nft_create_info(&tokens, &mut buffer, "tokens")
            .unwrap();

        let content = buffer.buffers().join("");
        assert!(content.contains(r#""_id" : "NFT-abcd-0e""#));
        assert!(content.contains(r#""name":"nifty""#));
    }

    #[test]
    fn ownership_transfer_is_a_scripted_owner_update() {
        let processor = logs_processor();
        let tokens = vec![TokenInfo {
            token: "TOK-abcd".to_string(),
            current_owner: "newowner".to_string(),
            transfer_ownership: true,
            ..Default::default()
        }];

        let mut buffer = BufferSlice::new(1 << 20);
        processor
            .serialize_tokens(&tokens, &[], &mut buffer, "tokens")
            .unwrap();

        let content = buffer.buffers().join("");
        assert!(content.contains("ctx._source.currentOwner = params.owner"));
        assert!(content.contains(r#""owner":"newowner""#));
    }
}
