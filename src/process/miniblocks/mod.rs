mod serialize;

use std::sync::Arc;

use log::warn;

use crate::{
    chain::{Body, Header, ProcessingType},
    hashing::Hasher,
    marshal::{calculate_hash, Marshalizer},
    data::Miniblock,
};

pub struct MiniblocksProcessor {
    hasher: Arc<dyn Hasher>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl MiniblocksProcessor {
    pub fn new(hasher: Arc<dyn Hasher>, marshalizer: Arc<dyn Marshalizer>) -> Self {
        MiniblocksProcessor { hasher, marshalizer }
    }

    /// Builds the miniblock documents for the observing shard. Only the side
    /// of the document the writer owns is populated: the producing shard
    /// sets `senderBlockHash`/`procTypeS`, the receiving shard
    /// `receiverBlockHash`/`procTypeD`.
    pub fn prepare_db_miniblocks(&self, header: &Header, body: &Body) -> Vec<Miniblock> {
        let header_hash = match calculate_hash(&*self.marshalizer, &*self.hasher, header) {
            Ok(hash) => hex::encode(hash),
            Err(err) => {
                warn!("cannot compute header hash for miniblocks: {err}");
                return Vec::new();
            }
        };

        let self_shard = header.shard_id();
        let mut miniblocks = Vec::new();
        for (idx, miniblock) in body.miniblocks.iter().enumerate() {
            let mb_hash = match calculate_hash(&*self.marshalizer, &*self.hasher, miniblock) {
                Ok(hash) => hex::encode(hash),
                Err(err) => {
                    warn!("cannot compute miniblock hash: {err}");
                    continue;
                }
            };

            let processing_type = header
                .miniblock_headers()
                .get(idx)
                .map(|mb_header| mb_header.processing_type)
                .unwrap_or(ProcessingType::Normal);

            let mut doc = Miniblock {
                hash: mb_hash,
                sender_shard_id: miniblock.sender_shard_id,
                receiver_shard_id: miniblock.receiver_shard_id,
                mb_type: miniblock.mb_type.as_str().to_string(),
                timestamp: header.timestamp(),
                reserved: miniblock.reserved.clone(),
                ..Default::default()
            };

            if self_shard == miniblock.sender_shard_id {
                doc.sender_block_hash = header_hash.clone();
                doc.processing_type_on_source = processing_type.as_str().to_string();
            }
            if self_shard == miniblock.receiver_shard_id {
                doc.receiver_block_hash = header_hash.clone();
                doc.processing_type_on_destination = processing_type.as_str().to_string();
            }

            miniblocks.push(doc);
        }

        miniblocks
    }

    /// Hex-encoded miniblock hashes for delete-by-query on revert.
    pub fn get_miniblocks_hashes_hex_encoded(&self, _header: &Header, body: &Body) -> Vec<String> {
        body.miniblocks
            .iter()
            .filter_map(
                |miniblock| match calculate_hash(&*self.marshalizer, &*self.hasher, miniblock) {
                    Ok(hash) => Some(hex::encode(hash)),
                    Err(err) => {
                        warn!("cannot compute miniblock hash for removal: {err}");
                        None
                    }
                },
            )
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MiniBlock, MiniBlockType, ShardHeader};
    use crate::hashing::Blake2bHasher;
    use crate::marshal::JsonMarshalizer;

    fn processor() -> MiniblocksProcessor {
        MiniblocksProcessor::new(Arc::new(Blake2bHasher), Arc::new(JsonMarshalizer))
    }

    fn body_with_miniblock(sender: u32, receiver: u32) -> Body {
        Body {
            miniblocks: vec![MiniBlock {
                sender_shard_id: sender,
                receiver_shard_id: receiver,
                mb_type: MiniBlockType::TxBlock,
                tx_hashes: vec![vec![0x01]],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn source_shard_sets_only_sender_side() {
        let header = Header::Shard(ShardHeader {
            shard_id: 0,
            timestamp: 5040,
            ..Default::default()
        });
        let docs = processor().prepare_db_miniblocks(&header, &body_with_miniblock(0, 1));

        assert_eq!(docs.len(), 1);
        assert!(!docs[0].sender_block_hash.is_empty());
        assert!(docs[0].receiver_block_hash.is_empty());
        assert_eq!(docs[0].processing_type_on_source, "Normal");
        assert!(docs[0].processing_type_on_destination.is_empty());
    }

    #[test]
    fn destination_shard_sets_only_receiver_side() {
        let header = Header::Shard(ShardHeader {
            shard_id: 1,
            ..Default::default()
        });
        let docs = processor().prepare_db_miniblocks(&header, &body_with_miniblock(0, 1));

        assert!(docs[0].sender_block_hash.is_empty());
        assert!(!docs[0].receiver_block_hash.is_empty());
    }

    #[test]
    fn intra_shard_sets_both_sides() {
        let header = Header::Shard(ShardHeader {
            shard_id: 0,
            ..Default::default()
        });
        let docs = processor().prepare_db_miniblocks(&header, &body_with_miniblock(0, 0));

        assert_eq!(docs[0].sender_block_hash, docs[0].receiver_block_hash);
        assert!(!docs[0].sender_block_hash.is_empty());
    }
}
