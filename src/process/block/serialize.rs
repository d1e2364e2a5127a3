use crate::{
    chain::Header,
    converters::json_escape,
    data::{Block, BufferSlice, EpochInfo},
};

use super::BlockProcessor;

impl BlockProcessor {
    /// Serializes the block document as one bulk `index` operation.
    pub fn serialize_block(
        &self,
        block: &Block,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        let meta = format!(
            r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
            index,
            json_escape(&block.hash)
        );
        let payload = serde_json::to_string(block)?;
        buffer.put_data(&meta, &payload);
        Ok(())
    }

    /// Writes the per-epoch fee totals, keyed by the epoch number.
    pub fn serialize_epoch_info(
        &self,
        header: &Header,
        buffer: &mut BufferSlice,
        index: &str,
    ) -> anyhow::Result<()> {
        let doc = EpochInfo {
            accumulated_fees: header.accumulated_fees().to_string(),
            developer_fees: header.developer_fees().to_string(),
        };

        let meta = format!(
            r#"{{ "index" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
            index,
            header.epoch()
        );
        let payload = serde_json::to_string(&doc)?;
        buffer.put_data(&meta, &payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        chain::MetaHeader, constants::DEFAULT_BULK_REQUEST_MAX_SIZE, hashing::Blake2bHasher,
        marshal::JsonMarshalizer,
    };

    #[test]
    fn block_serializes_with_id_meta() {
        let processor = BlockProcessor::new(Arc::new(Blake2bHasher), Arc::new(JsonMarshalizer));
        let block = Block {
            hash: "abcd".to_string(),
            nonce: 7,
            ..Default::default()
        };

        let mut buffer = BufferSlice::new(DEFAULT_BULK_REQUEST_MAX_SIZE);
        processor.serialize_block(&block, &mut buffer, "blocks").unwrap();

        let content = &buffer.buffers()[0];
        let mut lines = content.lines();
        assert_eq!(
            lines.next().unwrap(),
            r#"{ "index" : { "_index":"blocks", "_id" : "abcd" } }"#
        );
        let doc: serde_json::Value = serde_json::from_str(lines.next().unwrap()).unwrap();
        assert_eq!(doc["nonce"], 7);
        assert!(doc.get("hash").is_none());
    }

    #[test]
    fn epoch_info_is_keyed_by_epoch() {
        let processor = BlockProcessor::new(Arc::new(Blake2bHasher), Arc::new(JsonMarshalizer));
        let header = Header::Meta(MetaHeader {
            epoch: 42,
            accumulated_fees: "1000".to_string(),
            developer_fees: "100".to_string(),
            ..Default::default()
        });

        let mut buffer = BufferSlice::new(DEFAULT_BULK_REQUEST_MAX_SIZE);
        processor
            .serialize_epoch_info(&header, &mut buffer, "epochinfo")
            .unwrap();

        let content = &buffer.buffers()[0];
        assert!(content.contains(r#""_id" : "42""#));
        assert!(content.contains(r#""accumulatedFees":"1000""#));
    }
}
