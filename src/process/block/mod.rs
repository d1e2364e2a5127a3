mod serialize;

use std::sync::Arc;

use anyhow::Context;
use log::{debug, warn};

use crate::{
    chain::{Body, Header, MiniBlockType, Pool, SaveBlockData},
    constants::{METACHAIN_SHARD_ID, NOT_EXECUTED_IN_CURRENT_BLOCK, NOT_FOUND_IN_POOL},
    data::{
        block::ScheduledDataDoc, Block, EpochStartInfo, EpochStartShardDataDoc, MiniBlocksDetails,
        Miniblock,
    },
    hashing::Hasher,
    marshal::{calculate_hash, Marshalizer},
};

pub struct BlockProcessor {
    hasher: Arc<dyn Hasher>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl BlockProcessor {
    pub fn new(hasher: Arc<dyn Hasher>, marshalizer: Arc<dyn Marshalizer>) -> Self {
        BlockProcessor { hasher, marshalizer }
    }

    /// Projects the header and body into a block document.
    pub fn prepare_block_for_db(
        &self,
        args: &SaveBlockData,
        size_txs: usize,
    ) -> anyhow::Result<Block> {
        let header = &args.header;
        let body = &args.body;

        let block_size = self.compute_block_size(header, body)?;
        let miniblocks_hashes = self.encoded_miniblock_hashes(body);
        let (tx_count, notarized_txs_count) = get_txs_count(header);

        let mut block = Block {
            nonce: header.nonce(),
            round: header.round(),
            epoch: header.epoch(),
            shard_id: header.shard_id(),
            hash: hex::encode(&args.header_hash),
            miniblocks_hashes,
            notarized_blocks_hashes: args.notarized_headers_hashes.clone(),
            proposer: leader_index(&args.signers_indexes),
            validators: args.signers_indexes.clone(),
            pub_key_bitmap: hex::encode(header.pub_keys_bitmap()),
            size: block_size as i64,
            size_txs: size_txs as i64,
            timestamp: header.timestamp(),
            tx_count,
            notarized_txs_count,
            state_root_hash: hex::encode(header.state_root_hash()),
            prev_hash: hex::encode(header.prev_hash()),
            search_order: compute_block_search_order(header),
            epoch_start_block: header.is_start_of_epoch(),
            gas_provided: args.header_gas_consumption.gas_provided,
            gas_refunded: args.header_gas_consumption.gas_refunded,
            gas_penalized: args.header_gas_consumption.gas_penalized,
            max_gas_limit: args.header_gas_consumption.max_gas_per_block,
            accumulated_fees: header.accumulated_fees().to_string(),
            developer_fees: header.developer_fees().to_string(),
            ..Default::default()
        };

        if let Some(additional) = header.additional_data() {
            block.scheduled_data = Some(ScheduledDataDoc {
                scheduled_root_hash: hex::encode(&additional.scheduled_root_hash),
                scheduled_accumulated_fees: additional.scheduled_accumulated_fees.clone(),
                scheduled_developer_fees: additional.scheduled_developer_fees.clone(),
                scheduled_gas_provided: additional.scheduled_gas_provided,
                scheduled_gas_penalized: additional.scheduled_gas_penalized,
                scheduled_gas_refunded: additional.scheduled_gas_refunded,
            });
        }

        add_epoch_start_info_for_meta(header, &mut block);
        put_miniblocks_details_in_block(header, &mut block, &args.transaction_pool, body);

        Ok(block)
    }

    pub fn compute_header_hash(&self, header: &Header) -> anyhow::Result<Vec<u8>> {
        calculate_hash(&*self.marshalizer, &*self.hasher, header)
    }

    fn compute_block_size(&self, header: &Header, body: &Body) -> anyhow::Result<usize> {
        let header_bytes = self
            .marshalizer
            .marshal(header)
            .context("marshalling header for size")?;
        let body_bytes = self
            .marshalizer
            .marshal(body)
            .context("marshalling body for size")?;
        Ok(header_bytes.len() + body_bytes.len())
    }

    fn encoded_miniblock_hashes(&self, body: &Body) -> Vec<String> {
        let mut hashes = Vec::new();
        for miniblock in &body.miniblocks {
            match calculate_hash(&*self.marshalizer, &*self.hasher, miniblock) {
                Ok(hash) => hashes.push(hex::encode(hash)),
                Err(err) => {
                    warn!("internal error computing miniblock hash: {err}");
                }
            }
        }
        hashes
    }

}

fn get_txs_count(header: &Header) -> (u32, u32) {
    let num_txs = header.tx_count();
    if header.shard_id() != METACHAIN_SHARD_ID {
        return (num_txs, 0);
    }

    let mut in_miniblocks: u32 = 0;
    for mb_header in header.miniblock_headers() {
        if mb_header.mb_type == MiniBlockType::PeerBlock {
            continue;
        }
        in_miniblocks += mb_header.tx_count;
    }

    // the subtraction can wrap for non-epoch-start meta headers; both raw
    // values are stored
    (in_miniblocks, num_txs.wrapping_sub(in_miniblocks))
}

fn add_epoch_start_info_for_meta(header: &Header, block: &mut Block) {
    let Header::Meta(meta) = header else {
        return;
    };
    let Some(epoch_start) = &meta.epoch_start else {
        return;
    };

    let economics = &epoch_start.economics;
    block.epoch_start_info = Some(EpochStartInfo {
        total_supply: economics.total_supply.clone(),
        total_to_distribute: economics.total_to_distribute.clone(),
        total_newly_minted: economics.total_newly_minted.clone(),
        rewards_per_block: economics.rewards_per_block.clone(),
        rewards_for_protocol_sustainability: economics
            .rewards_for_protocol_sustainability
            .clone(),
        node_price: economics.node_price.clone(),
        prev_epoch_start_round: economics.prev_epoch_start_round,
        prev_epoch_start_hash: hex::encode(&economics.prev_epoch_start_hash),
    });

    for shard_data in &epoch_start.last_finalized_headers {
        let mut doc = EpochStartShardDataDoc {
            shard_id: shard_data.shard_id,
            epoch: shard_data.epoch,
            round: shard_data.round,
            nonce: shard_data.nonce,
            header_hash: hex::encode(&shard_data.header_hash),
            root_hash: hex::encode(&shard_data.root_hash),
            scheduled_root_hash: hex::encode(&shard_data.scheduled_root_hash),
            first_pending_meta_block: hex::encode(&shard_data.first_pending_meta_block),
            last_finished_meta_block: hex::encode(&shard_data.last_finished_meta_block),
            pending_miniblock_headers: Vec::new(),
        };

        for pending in &shard_data.pending_miniblock_headers {
            doc.pending_miniblock_headers.push(Miniblock {
                hash: hex::encode(&pending.hash),
                sender_shard_id: pending.sender_shard_id,
                receiver_shard_id: pending.receiver_shard_id,
                mb_type: pending.mb_type.as_str().to_string(),
                reserved: pending.reserved.clone(),
                ..Default::default()
            });
        }

        block.epoch_start_shards_data.push(doc);
    }
}

fn put_miniblocks_details_in_block(header: &Header, block: &mut Block, pool: &Pool, body: &Body) {
    for (idx, mb_header) in header.miniblock_headers().iter().enumerate() {
        if mb_header.mb_type == MiniBlockType::PeerBlock {
            continue;
        }

        let Some(miniblock) = body.miniblocks.get(idx) else {
            warn!("miniblock header {idx} has no body counterpart");
            continue;
        };

        let txs_hashes: Vec<String> = miniblock.tx_hashes.iter().map(hex::encode).collect();
        block.miniblocks_details.push(MiniBlocksDetails {
            index_first_processed_tx: mb_header.index_of_first_tx_processed,
            index_last_processed_tx: mb_header.index_of_last_tx_processed,
            mb_index: idx,
            mb_type: mb_header.mb_type.as_str().to_string(),
            processing_type: mb_header.processing_type.as_str().to_string(),
            sender_shard: mb_header.sender_shard_id,
            receiver_shard: mb_header.receiver_shard_id,
            execution_order_txs_indices: extract_execution_order_indices(
                mb_header.index_of_first_tx_processed,
                mb_header.index_of_last_tx_processed,
                mb_header.mb_type,
                &txs_hashes,
                pool,
            ),
            txs_hashes,
        });
    }
}

fn extract_execution_order_indices(
    first_processed: i32,
    last_processed: i32,
    mb_type: MiniBlockType,
    txs_hashes: &[String],
    pool: &Pool,
) -> Vec<i32> {
    let mut indices = Vec::with_capacity(txs_hashes.len());
    for (idx, tx_hash) in txs_hashes.iter().enumerate() {
        let executed_here = idx as i32 >= first_processed && idx as i32 <= last_processed;
        if !executed_here {
            indices.push(NOT_EXECUTED_IN_CURRENT_BLOCK);
            continue;
        }

        match execution_order_from_pool(pool, mb_type, tx_hash) {
            Some(order) => indices.push(order),
            None => {
                warn!("cannot find tx {tx_hash} in pool for execution order");
                indices.push(NOT_FOUND_IN_POOL);
            }
        }
    }
    indices
}

fn execution_order_from_pool(pool: &Pool, mb_type: MiniBlockType, tx_hash: &str) -> Option<i32> {
    match mb_type {
        MiniBlockType::TxBlock => pool.txs.get(tx_hash).map(|info| info.execution_order),
        MiniBlockType::InvalidBlock => pool.invalid.get(tx_hash).map(|info| info.execution_order),
        MiniBlockType::RewardsBlock => pool.rewards.get(tx_hash).map(|info| info.execution_order),
        MiniBlockType::SmartContractResultBlock => {
            pool.scrs.get(tx_hash).map(|info| info.execution_order)
        }
        _ => None,
    }
}

fn leader_index(signers_indexes: &[u64]) -> u64 {
    signers_indexes.first().copied().unwrap_or(0)
}

/// `1SSnonce` as a decimal integer: SS is 01 for the metachain and shard+2
/// otherwise, so blocks sort by (shard, nonce).
pub fn compute_block_search_order(header: &Header) -> u64 {
    let shard_identifier = if header.shard_id() == METACHAIN_SHARD_ID {
        1
    } else {
        header.shard_id() + 2
    };

    let formatted = format!("1{:02}{}", shard_identifier, header.nonce());
    match formatted.parse::<u64>() {
        Ok(order) => order,
        Err(err) => {
            debug!("could not compute block search order from {formatted}: {err}");
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{
        MetaHeader, MiniBlock, MiniBlockHeader, ProcessingType, ShardHeader, Transaction, TxInfo,
    };
    use crate::hashing::Blake2bHasher;
    use crate::marshal::JsonMarshalizer;

    fn shard_header(shard_id: u32, nonce: u64) -> Header {
        Header::Shard(ShardHeader {
            shard_id,
            nonce,
            ..Default::default()
        })
    }

    #[test]
    fn search_order_encodes_shard_and_nonce() {
        assert_eq!(compute_block_search_order(&shard_header(0, 10)), 10210);
        assert_eq!(compute_block_search_order(&shard_header(1, 10)), 10310);
        assert_eq!(
            compute_block_search_order(&Header::Meta(MetaHeader {
                nonce: 10,
                ..Default::default()
            })),
            10110
        );
    }

    #[test]
    fn search_order_is_monotonic_per_shard() {
        let mut previous = 0;
        for nonce in [1u64, 2, 57, 1000, 123_456] {
            let order = compute_block_search_order(&shard_header(0, nonce));
            assert!(order > previous);
            previous = order;
        }
    }

    #[test]
    fn search_order_overflow_falls_back_to_zero() {
        assert_eq!(
            compute_block_search_order(&shard_header(0, u64::MAX / 10)),
            0
        );
    }

    #[test]
    fn meta_tx_counts_exclude_peer_miniblocks() {
        let header = Header::Meta(MetaHeader {
            tx_count: 100,
            miniblock_headers: vec![
                MiniBlockHeader {
                    mb_type: MiniBlockType::TxBlock,
                    tx_count: 30,
                    ..Default::default()
                },
                MiniBlockHeader {
                    mb_type: MiniBlockType::PeerBlock,
                    tx_count: 7,
                    ..Default::default()
                },
                MiniBlockHeader {
                    mb_type: MiniBlockType::SmartContractResultBlock,
                    tx_count: 20,
                    ..Default::default()
                },
            ],
            ..Default::default()
        });

        let (txs, notarized) = get_txs_count(&header);
        assert_eq!(txs, 50);
        assert_eq!(notarized, 50);
    }

    #[test]
    fn shard_tx_count_is_taken_from_header() {
        let header = Header::Shard(ShardHeader {
            tx_count: 12,
            ..Default::default()
        });
        assert_eq!(get_txs_count(&header), (12, 0));
    }

    #[test]
    fn execution_order_sentinels() {
        let tx_hash = vec![0xaa];
        let hex_hash = hex::encode(&tx_hash);
        let mut pool = Pool::default();
        pool.txs.insert(
            hex_hash,
            TxInfo {
                tx: Transaction::default(),
                execution_order: 3,
            },
        );

        let header = Header::Shard(ShardHeader {
            miniblock_headers: vec![MiniBlockHeader {
                mb_type: MiniBlockType::TxBlock,
                processing_type: ProcessingType::Normal,
                index_of_first_tx_processed: 0,
                index_of_last_tx_processed: 1,
                ..Default::default()
            }],
            ..Default::default()
        });
        let body = Body {
            miniblocks: vec![MiniBlock {
                tx_hashes: vec![tx_hash, vec![0xbb], vec![0xcc]],
                mb_type: MiniBlockType::TxBlock,
                ..Default::default()
            }],
        };

        let mut block = Block::default();
        put_miniblocks_details_in_block(&header, &mut block, &pool, &body);

        assert_eq!(block.miniblocks_details.len(), 1);
        let details = &block.miniblocks_details[0];
        // in window and in pool, in window but missing, outside window
        assert_eq!(details.execution_order_txs_indices, vec![3, -2, -1]);
    }

    #[test]
    fn prepare_block_sets_sizes_and_hash() {
        let processor = BlockProcessor::new(Arc::new(Blake2bHasher), Arc::new(JsonMarshalizer));
        let args = SaveBlockData {
            header_hash: vec![0x01, 0x02],
            header: shard_header(0, 5),
            ..Default::default()
        };

        let block = processor.prepare_block_for_db(&args, 123).unwrap();
        assert_eq!(block.hash, "0102");
        assert_eq!(block.size_txs, 123);
        assert!(block.size > 0);
        assert_eq!(block.search_order, 1025);
    }
}
