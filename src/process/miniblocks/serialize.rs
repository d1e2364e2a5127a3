use std::collections::HashMap;

use log::warn;

use crate::{
    converters::json_escape,
    data::{BufferSlice, Miniblock},
};

use super::MiniblocksProcessor;

impl MiniblocksProcessor {
    /// Serializes the miniblock documents. A hash already present in the
    /// store turns into a partial update of the side this writer owns, so
    /// source and destination never clobber each other.
    pub fn serialize_bulk_miniblocks(
        &self,
        miniblocks: &[Miniblock],
        exists_in_db: &HashMap<String, bool>,
        buffer: &mut BufferSlice,
        index: &str,
        self_shard: u32,
    ) {
        for miniblock in miniblocks {
            let already_in_db = exists_in_db.get(&miniblock.hash).copied().unwrap_or(false);
            match prepare_miniblock_data(miniblock, already_in_db, index, self_shard) {
                Ok((meta, payload)) => buffer.put_data(&meta, &payload),
                Err(err) => {
                    warn!("cannot prepare miniblock data: {err}");
                }
            }
        }
    }
}

fn prepare_miniblock_data(
    miniblock: &Miniblock,
    already_in_db: bool,
    index: &str,
    self_shard: u32,
) -> anyhow::Result<(String, String)> {
    if !already_in_db {
        let meta = format!(
            r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
            index,
            json_escape(&miniblock.hash)
        );
        return Ok((meta, serde_json::to_string(miniblock)?));
    }

    let meta = format!(
        r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
        index,
        json_escape(&miniblock.hash)
    );

    let writer_is_source = self_shard == miniblock.sender_shard_id;
    let destination_done = miniblock.processing_type_on_destination == "Processed";
    let payload = if writer_is_source && !destination_done {
        format!(
            r#"{{ "doc" : {{ "senderBlockHash" : "{}", "procTypeS": "{}" }} }}"#,
            json_escape(&miniblock.sender_block_hash),
            json_escape(&miniblock.processing_type_on_source)
        )
    } else {
        format!(
            r#"{{ "doc" : {{ "receiverBlockHash" : "{}", "procTypeD": "{}" }} }}"#,
            json_escape(&miniblock.receiver_block_hash),
            json_escape(&miniblock.processing_type_on_destination)
        )
    };

    Ok((meta, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miniblock() -> Miniblock {
        Miniblock {
            hash: "mbhash".to_string(),
            sender_shard_id: 0,
            receiver_shard_id: 1,
            sender_block_hash: "srcblock".to_string(),
            receiver_block_hash: "dstblock".to_string(),
            processing_type_on_source: "Normal".to_string(),
            processing_type_on_destination: "Normal".to_string(),
            mb_type: "TxBlock".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn new_miniblock_is_a_plain_index() {
        let (meta, payload) = prepare_miniblock_data(&miniblock(), false, "miniblocks", 0).unwrap();
        assert!(meta.contains(r#""index""#));
        assert!(meta.contains("mbhash"));
        let doc: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(doc["senderShard"], 0);
    }

    #[test]
    fn existing_miniblock_updates_sender_side_at_source() {
        let (meta, payload) = prepare_miniblock_data(&miniblock(), true, "miniblocks", 0).unwrap();
        assert!(meta.contains(r#""update""#));
        assert!(payload.contains("senderBlockHash"));
        assert!(payload.contains("procTypeS"));
        assert!(!payload.contains("receiverBlockHash"));
    }

    #[test]
    fn existing_miniblock_updates_receiver_side_at_destination() {
        let (_, payload) = prepare_miniblock_data(&miniblock(), true, "miniblocks", 1).unwrap();
        assert!(payload.contains("receiverBlockHash"));
        assert!(payload.contains("procTypeD"));
    }

    #[test]
    fn processed_destination_wins_even_at_source() {
        let mut mb = miniblock();
        mb.processing_type_on_destination = "Processed".to_string();
        let (_, payload) = prepare_miniblock_data(&mb, true, "miniblocks", 0).unwrap();
        assert!(payload.contains("receiverBlockHash"));
    }
}
