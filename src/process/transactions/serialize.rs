use std::collections::HashMap;

use serde_json::json;

use crate::{
    constants::TX_STATUS_INVALID,
    converters::json_escape,
    data::{BufferSlice, FeeData, Receipt, ScResult, Transaction},
};

use super::TransactionsProcessor;

impl TransactionsProcessor {
    /// Serializes transaction documents with the per-shard asymmetric
    /// strategy: plain insert on the owning shard, write-nothing upsert at
    /// source, field-overlay scripted upsert at destination.
    pub fn serialize_transactions(
        &self,
        txs: &[Transaction],
        tx_hash_status: &HashMap<String, String>,
        self_shard: u32,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for tx in txs {
            let (meta, payload) = prepare_serialized_data_for_a_transaction(tx, self_shard, index)?;
            buffer.put_data(&meta, &payload);
        }

        serialize_tx_hash_status(tx_hash_status, buffer, index);
        Ok(())
    }

    pub fn serialize_scrs(
        &self,
        scrs: &[ScResult],
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for scr in scrs {
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&scr.hash)
            );
            buffer.put_data(&meta, &serde_json::to_string(scr)?);
        }
        Ok(())
    }

    pub fn serialize_receipts(
        &self,
        receipts: &[Receipt],
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        for receipt in receipts {
            let meta = format!(
                r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&receipt.hash)
            );
            buffer.put_data(&meta, &serde_json::to_string(receipt)?);
        }
        Ok(())
    }

    /// Fee corrections computed from orphan refunds: scripted updates that
    /// overwrite `fee` and `gasUsed` on the already-indexed document.
    pub fn serialize_transactions_fee_data(
        &self,
        fee_data: &HashMap<String, FeeData>,
        buffer: &mut BufferSlice,
        index: &str,
    ) {
        for (tx_hash, fee) in fee_data {
            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(tx_hash)
            );
            let payload = json!({
                "script": {
                    "source": "ctx._source.fee = params.fee; ctx._source.gasUsed = params.gasUsed",
                    "lang": "painless",
                    "params": {"fee": fee.fee, "gasUsed": fee.gas_used}
                }
            });
            buffer.put_data(&meta, &payload.to_string());
        }
    }
}

fn prepare_serialized_data_for_a_transaction(
    tx: &Transaction,
    self_shard: u32,
    index: &str,
) -> anyhow::Result<(String, String)> {
    let payload = serde_json::to_string(tx)?;

    if is_intra_shard_or_invalid(tx, self_shard) {
        // the row is owned by this writer and may be rewritten at forks
        let meta = format!(
            r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
            index,
            json_escape(&tx.hash)
        );
        return Ok((meta, payload));
    }

    let meta = format!(
        r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
        index,
        json_escape(&tx.hash)
    );

    if !is_cross_shard_dst_me(tx, self_shard) {
        // source of a cross-shard tx: create the row, never touch an
        // existing one
        let body = format!(r#"{{"script":{{"source":"return"}},"upsert":{payload}}}"#);
        return Ok((meta, body));
    }

    // destination of a cross-shard tx: overlay exactly the fields the
    // destination owns on whatever the source wrote
    let body = json!({
        "script": {
            "source": "ctx._source.status = params.status; \
                       ctx._source.miniBlockHash = params.miniBlockHash; \
                       ctx._source.logs = params.logs; \
                       ctx._source.timestamp = params.timestamp; \
                       ctx._source.gasUsed = params.gasUsed; \
                       ctx._source.fee = params.fee; \
                       ctx._source.hasScResults = params.hasScResults",
            "lang": "painless",
            "params": {
                "status": tx.status,
                "miniBlockHash": tx.mb_hash,
                "logs": tx.logs,
                "timestamp": tx.timestamp,
                "gasUsed": tx.gas_used,
                "fee": tx.fee,
                "hasScResults": tx.has_scr
            }
        },
        "upsert": serde_json::to_value(tx)?
    });

    Ok((meta, body.to_string()))
}

/// Orphan status corrections: set `status` in place, or create a minimal
/// status-only document when the destination is indexed before the source.
fn serialize_tx_hash_status(
    tx_hash_status: &HashMap<String, String>,
    buffer: &mut BufferSlice,
    index: &str,
) {
    for (tx_hash, status) in tx_hash_status {
        let meta = format!(
            r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
            index,
            json_escape(tx_hash)
        );
        let upsert = Transaction {
            status: status.clone(),
            ..Default::default()
        };
        let payload = json!({
            "script": {
                "source": "ctx._source.status = params.status",
                "lang": "painless",
                "params": {"status": status}
            },
            "upsert": serde_json::to_value(&upsert).unwrap_or_default()
        });
        buffer.put_data(&meta, &payload.to_string());
    }
}

fn is_intra_shard_or_invalid(tx: &Transaction, self_shard: u32) -> bool {
    (tx.sender_shard == tx.receiver_shard && tx.receiver_shard == self_shard)
        || tx.status == TX_STATUS_INVALID
}

fn is_cross_shard_dst_me(tx: &Transaction, self_shard: u32) -> bool {
    tx.receiver_shard == self_shard && tx.sender_shard != self_shard
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_shard_tx() -> Transaction {
        Transaction {
            hash: "aabb".to_string(),
            sender_shard: 0,
            receiver_shard: 1,
            status: "pending".to_string(),
            mb_hash: "mbh".to_string(),
            gas_used: 100,
            fee: "1000".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn intra_shard_uses_plain_index() {
        let mut tx = cross_shard_tx();
        tx.sender_shard = 0;
        tx.receiver_shard = 0;

        let (meta, payload) =
            prepare_serialized_data_for_a_transaction(&tx, 0, "transactions").unwrap();
        assert!(meta.contains(r#""index""#));
        let doc: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(doc["miniBlockHash"], "mbh");
    }

    #[test]
    fn invalid_tx_uses_plain_index_even_cross_shard() {
        let mut tx = cross_shard_tx();
        tx.status = TX_STATUS_INVALID.to_string();

        let (meta, _) = prepare_serialized_data_for_a_transaction(&tx, 0, "transactions").unwrap();
        assert!(meta.contains(r#""index""#));
    }

    #[test]
    fn cross_shard_source_upserts_without_updating() {
        let (meta, payload) =
            prepare_serialized_data_for_a_transaction(&cross_shard_tx(), 0, "transactions")
                .unwrap();
        assert!(meta.contains(r#""update""#));
        assert!(payload.starts_with(r#"{"script":{"source":"return"},"upsert":"#));
    }

    #[test]
    fn cross_shard_destination_overlays_owned_fields() {
        let (meta, payload) =
            prepare_serialized_data_for_a_transaction(&cross_shard_tx(), 1, "transactions")
                .unwrap();
        assert!(meta.contains(r#""update""#));

        let body: serde_json::Value = serde_json::from_str(&payload).unwrap();
        let source = body["script"]["source"].as_str().unwrap();
        for field in [
            "status",
            "miniBlockHash",
            "logs",
            "timestamp",
            "gasUsed",
            "fee",
            "hasScResults",
        ] {
            assert!(source.contains(field), "script misses {field}");
        }
        assert_eq!(body["script"]["params"]["status"], "pending");
        assert_eq!(body["upsert"]["miniBlockHash"], "mbh");
    }

    #[test]
    fn status_patch_upserts_minimal_document() {
        let mut statuses = HashMap::new();
        statuses.insert("ffee".to_string(), "fail".to_string());

        let mut buffer = BufferSlice::new(1 << 20);
        serialize_tx_hash_status(&statuses, &mut buffer, "transactions");

        let content = &buffer.buffers()[0];
        let mut lines = content.lines();
        assert!(lines.next().unwrap().contains(r#""_id" : "ffee""#));
        let body: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(body["upsert"]["status"], "fail");
        assert!(body["upsert"].get("hasScResults").is_none());
    }
}
