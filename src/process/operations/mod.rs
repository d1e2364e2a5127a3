use crate::{
    constants::{TX_STATUS_PENDING, TX_STATUS_SUCCESS},
    converters::json_escape,
    data::{BufferSlice, ScResult, Transaction},
};

const TX_TYPE_NORMAL: &str = "normal";
const TX_TYPE_UNSIGNED: &str = "unsigned";

/// Prepares the unified operations view: transactions and SCRs side by
/// side, destination-filtered in import mode.
pub struct OperationsProcessor;

impl OperationsProcessor {
    pub fn new() -> Self {
        OperationsProcessor
    }

    pub fn process_transactions_and_scrs(
        &self,
        txs: &[Transaction],
        scrs: &[ScResult],
        is_import_db: bool,
        self_shard: u32,
    ) -> (Vec<Transaction>, Vec<ScResult>) {
        let txs = txs
            .iter()
            .filter(|tx| should_index(tx.receiver_shard, is_import_db, self_shard))
            .map(|tx| {
                let mut tx = tx.clone();
                tx.smart_contract_results = Vec::new();
                tx.tx_type = TX_TYPE_NORMAL.to_string();
                tx
            })
            .collect();

        let scrs = scrs
            .iter()
            .filter(|scr| should_index(scr.receiver_shard, is_import_db, self_shard))
            .map(|scr| {
                let mut scr = scr.clone();
                scr.scr_type = TX_TYPE_UNSIGNED.to_string();
                scr.status = if self_shard == scr.receiver_shard {
                    TX_STATUS_SUCCESS.to_string()
                } else {
                    TX_STATUS_PENDING.to_string()
                };
                scr
            })
            .collect();

        (txs, scrs)
    }

    /// SCR rows in the operations index: inserts where this shard owns the
    /// row, create-only upserts otherwise.
    pub fn serialize_scrs(
        &self,
        scrs: &[ScResult],
        buffer: &mut BufferSlice,
        index: &str,
        self_shard: u32,
    ) -> anyhow::Result<()> {
        for scr in scrs {
            let owns_row = self_shard == scr.receiver_shard || scr.sender_shard == scr.receiver_shard;
            if owns_row {
                let meta = format!(
                    r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                    index,
                    json_escape(&scr.hash)
                );
                buffer.put_data(&meta, &serde_json::to_string(scr)?);
                continue;
            }

            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index,
                json_escape(&scr.hash)
            );
            let payload = format!(
                r#"{{"script":{{"source":"return"}},"upsert":{}}}"#,
                serde_json::to_string(scr)?
            );
            buffer.put_data(&meta, &payload);
        }
        Ok(())
    }
}

fn should_index(destination_shard: u32, is_import_db: bool, self_shard: u32) -> bool {
    if !is_import_db {
        return true;
    }
    self_shard == destination_shard
}
