mod builder;
mod grouper;
mod scrs_to_txs;
mod serialize;

use std::{collections::HashMap, sync::Arc};

use log::warn;

use crate::{
    address::PubkeyConverter,
    chain::{Body, Header, MiniBlockType, Pool, ProcessingType},
    data::{PreparedResults, ScResult, Transaction},
    fees::FeesProcessor,
    hashing::Hasher,
    marshal::{calculate_hash, Marshalizer},
};

use builder::TxBuilder;
use grouper::TxsGrouper;
use scrs_to_txs::ScrsDataToTransactions;

pub struct TransactionsProcessor {
    builder: Arc<TxBuilder>,
    grouper: TxsGrouper,
    scrs_to_txs: ScrsDataToTransactions,
    hasher: Arc<dyn Hasher>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl TransactionsProcessor {
    pub fn new(
        converter: Arc<dyn PubkeyConverter>,
        hasher: Arc<dyn Hasher>,
        marshalizer: Arc<dyn Marshalizer>,
        fees: Arc<FeesProcessor>,
    ) -> Self {
        let builder = Arc::new(TxBuilder::new(converter, fees.clone()));
        TransactionsProcessor {
            grouper: TxsGrouper::new(builder.clone(), hasher.clone(), marshalizer.clone()),
            scrs_to_txs: ScrsDataToTransactions::new(fees),
            builder,
            hasher,
            marshalizer,
        }
    }

    /// Walks the body's miniblocks and projects the pool into transaction,
    /// SCR and receipt documents, with SCR outcomes folded in.
    pub fn prepare_transactions_for_database(
        &self,
        body: &Body,
        header: &Header,
        pool: &Pool,
        is_import_db: bool,
        number_of_shards: u32,
    ) -> PreparedResults {
        let mut normal_txs: HashMap<String, Transaction> = HashMap::new();
        let mut rewards_txs: HashMap<String, Transaction> = HashMap::new();

        for (mb_index, miniblock) in body.miniblocks.iter().enumerate() {
            match miniblock.mb_type {
                MiniBlockType::TxBlock => {
                    if should_ignore_processed_mb_scheduled(header, mb_index) {
                        continue;
                    }
                    match self
                        .grouper
                        .group_normal_txs(mb_index, miniblock, header, pool, is_import_db)
                    {
                        Ok(txs) => normal_txs.extend(txs),
                        Err(err) => warn!("group normal txs: {err}"),
                    }
                }
                MiniBlockType::RewardsBlock => {
                    match self
                        .grouper
                        .group_rewards_txs(mb_index, miniblock, header, pool, is_import_db)
                    {
                        Ok(txs) => rewards_txs.extend(txs),
                        Err(err) => warn!("group rewards txs: {err}"),
                    }
                }
                MiniBlockType::InvalidBlock => {
                    match self.grouper.group_invalid_txs(mb_index, miniblock, header, pool) {
                        Ok(txs) => normal_txs.extend(txs),
                        Err(err) => warn!("group invalid txs: {err}"),
                    }
                }
                _ => continue,
            }
        }

        set_transaction_search_order(&mut normal_txs);
        let receipts = self.grouper.group_receipts(header, pool);
        let scrs = self.process_scrs(body, header, pool, number_of_shards);

        let orphans = self
            .scrs_to_txs
            .attach_scrs_to_transactions_and_return_scrs_without_tx(&mut normal_txs, &scrs);
        self.scrs_to_txs
            .process_transactions_after_scrs_were_attached(&mut normal_txs);
        let (tx_hash_status, tx_hash_refund) = self.scrs_to_txs.process_scrs_without_tx(&orphans);

        let mut transactions: Vec<Transaction> = normal_txs.into_values().collect();
        transactions.extend(rewards_txs.into_values());

        PreparedResults {
            transactions,
            scrs,
            receipts,
            tx_hash_status,
            tx_hash_refund,
        }
    }

    /// SCR documents are built from the whole pool: intra-shard results may
    /// not appear in any miniblock of the body.
    fn process_scrs(
        &self,
        body: &Body,
        header: &Header,
        pool: &Pool,
        number_of_shards: u32,
    ) -> Vec<ScResult> {
        let mut mb_hash_per_scr: HashMap<String, String> = HashMap::new();
        for miniblock in &body.miniblocks {
            if miniblock.mb_type != MiniBlockType::SmartContractResultBlock {
                continue;
            }
            let mb_hash = match calculate_hash(&*self.marshalizer, &*self.hasher, miniblock) {
                Ok(hash) => hex::encode(hash),
                Err(err) => {
                    warn!("cannot compute scr miniblock hash: {err}");
                    continue;
                }
            };
            for tx_hash in &miniblock.tx_hashes {
                mb_hash_per_scr.insert(hex::encode(tx_hash), mb_hash.clone());
            }
        }

        pool.scrs
            .iter()
            .map(|(scr_hash, info)| {
                let mb_hash = mb_hash_per_scr
                    .get(scr_hash)
                    .map(String::as_str)
                    .unwrap_or("");
                self.builder
                    .prepare_scr(scr_hash, &info.tx, mb_hash, header, number_of_shards)
            })
            .collect()
    }

    /// Hex hashes to delete on revert: transactions (normal, rewards,
    /// invalid) and SCRs, skipping cross-shard tx miniblocks seen at source
    /// whose rows are owned by the destination shard.
    pub fn get_hex_encoded_hashes_for_remove(
        &self,
        header: &Header,
        body: &Body,
    ) -> (Vec<String>, Vec<String>) {
        if header.miniblock_headers().is_empty() && body.miniblocks.is_empty() {
            return (Vec::new(), Vec::new());
        }

        let self_shard = header.shard_id();
        let mut tx_hashes = Vec::new();
        let mut scr_hashes = Vec::new();
        for miniblock in &body.miniblocks {
            if is_cross_shard_at_source_normal_tx(self_shard, miniblock) {
                // the destination shard still owns the document
                continue;
            }

            let encoded = miniblock.tx_hashes.iter().map(hex::encode);
            if miniblock.mb_type == MiniBlockType::SmartContractResultBlock {
                scr_hashes.extend(encoded);
            } else {
                tx_hashes.extend(encoded);
            }
        }

        (tx_hashes, scr_hashes)
    }
}

fn is_cross_shard_at_source_normal_tx(
    self_shard: u32,
    miniblock: &crate::chain::MiniBlock,
) -> bool {
    let cross_shard = miniblock.sender_shard_id != miniblock.receiver_shard_id;
    let at_source = miniblock.sender_shard_id == self_shard;
    cross_shard && at_source && miniblock.mb_type == MiniBlockType::TxBlock
}

fn should_ignore_processed_mb_scheduled(header: &Header, mb_index: usize) -> bool {
    header
        .miniblock_headers()
        .get(mb_index)
        .map(|mb_header| mb_header.processing_type == ProcessingType::Processed)
        .unwrap_or(false)
}

fn set_transaction_search_order(txs: &mut HashMap<String, Transaction>) {
    let mut current_order = 0;
    for tx in txs.values_mut() {
        tx.search_order = current_order;
        current_order += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        address::HexPubkeyConverter,
        chain::{self, MiniBlock, MiniBlockHeader, ShardHeader, TxInfo},
        config::EconomicsConfig,
        hashing::Blake2bHasher,
        marshal::JsonMarshalizer,
    };

    fn processor() -> TransactionsProcessor {
        let economics = EconomicsConfig {
            denomination: 18,
            min_gas_limit: 50_000,
            gas_per_data_byte: 1_500,
            gas_price_modifier: 0.01,
        };
        TransactionsProcessor::new(
            Arc::new(HexPubkeyConverter::new(6, "")),
            Arc::new(Blake2bHasher),
            Arc::new(JsonMarshalizer),
            Arc::new(FeesProcessor::new(&economics)),
        )
    }

    fn tx_pool_entry() -> TxInfo<chain::Transaction> {
        TxInfo::new(chain::Transaction {
            nonce: 1,
            sender: b"send01".to_vec(),
            receiver: b"recv01".to_vec(),
            gas_limit: 100_000,
            gas_price: 1_000_000_000,
            value: "0".to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn normal_and_invalid_txs_are_grouped() {
        let tx_hash = vec![0x01];
        let invalid_hash = vec![0x02];
        let mut pool = Pool::default();
        pool.txs.insert(hex::encode(&tx_hash), tx_pool_entry());
        pool.invalid
            .insert(hex::encode(&invalid_hash), tx_pool_entry());

        let header = Header::Shard(ShardHeader::default());
        let body = Body {
            miniblocks: vec![
                MiniBlock {
                    tx_hashes: vec![tx_hash],
                    mb_type: MiniBlockType::TxBlock,
                    ..Default::default()
                },
                MiniBlock {
                    tx_hashes: vec![invalid_hash],
                    mb_type: MiniBlockType::InvalidBlock,
                    ..Default::default()
                },
            ],
        };

        let results = processor().prepare_transactions_for_database(&body, &header, &pool, false, 1);
        assert_eq!(results.transactions.len(), 2);

        let invalid = results
            .transactions
            .iter()
            .find(|tx| tx.status == "invalid")
            .unwrap();
        assert_eq!(invalid.gas_used, invalid.gas_limit);
    }

    #[test]
    fn processed_scheduled_miniblock_is_skipped() {
        let tx_hash = vec![0x01];
        let mut pool = Pool::default();
        pool.txs.insert(hex::encode(&tx_hash), tx_pool_entry());

        let header = Header::Shard(ShardHeader {
            miniblock_headers: vec![MiniBlockHeader {
                processing_type: ProcessingType::Processed,
                index_of_last_tx_processed: 0,
                ..Default::default()
            }],
            ..Default::default()
        });
        let body = Body {
            miniblocks: vec![MiniBlock {
                tx_hashes: vec![tx_hash],
                mb_type: MiniBlockType::TxBlock,
                ..Default::default()
            }],
        };

        let results = processor().prepare_transactions_for_database(&body, &header, &pool, false, 1);
        assert!(results.transactions.is_empty());
    }

    #[test]
    fn remove_hashes_skip_cross_shard_at_source() {
        let header = Header::Shard(ShardHeader {
            shard_id: 0,
            miniblock_headers: vec![MiniBlockHeader::default()],
            ..Default::default()
        });
        let body = Body {
            miniblocks: vec![
                // cross-shard at source: skipped
                MiniBlock {
                    tx_hashes: vec![vec![0x01]],
                    sender_shard_id: 0,
                    receiver_shard_id: 1,
                    mb_type: MiniBlockType::TxBlock,
                    ..Default::default()
                },
                // intra-shard: collected
                MiniBlock {
                    tx_hashes: vec![vec![0x02]],
                    sender_shard_id: 0,
                    receiver_shard_id: 0,
                    mb_type: MiniBlockType::TxBlock,
                    ..Default::default()
                },
                // scrs: collected separately, even cross-shard at source
                MiniBlock {
                    tx_hashes: vec![vec![0x03]],
                    sender_shard_id: 0,
                    receiver_shard_id: 1,
                    mb_type: MiniBlockType::SmartContractResultBlock,
                    ..Default::default()
                },
            ],
        };

        let (txs, scrs) = processor().get_hex_encoded_hashes_for_remove(&header, &body);
        assert_eq!(txs, vec!["02".to_string()]);
        assert_eq!(scrs, vec!["03".to_string()]);
    }

    #[test]
    fn search_order_is_assigned_once_per_tx() {
        let mut txs = HashMap::new();
        txs.insert("aa".to_string(), Transaction::default());
        txs.insert("bb".to_string(), Transaction::default());
        txs.insert("cc".to_string(), Transaction::default());

        set_transaction_search_order(&mut txs);

        let mut orders: Vec<u32> = txs.values().map(|tx| tx.search_order).collect();
        orders.sort_unstable();
        assert_eq!(orders, vec![0, 1, 2]);
    }
}
