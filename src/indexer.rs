use std::{collections::HashMap, sync::Arc};

use log::trace;

use crate::{
    chain::{AlteredAccount, Body, Header, Pool, SaveBlockData},
    data::{RoundInfo, ValidatorRatingInfo},
    dispatcher::{DataDispatcher, WorkItem},
    marshal::Marshalizer,
};

/// Converts the observer callbacks into work items and hands them to the
/// dispatcher queue.
pub struct DataIndexer {
    dispatcher: Arc<DataDispatcher>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl DataIndexer {
    pub fn new(dispatcher: Arc<DataDispatcher>, marshalizer: Arc<dyn Marshalizer>) -> Self {
        DataIndexer {
            dispatcher,
            marshalizer,
        }
    }

    pub async fn save_block(&self, args: SaveBlockData) {
        trace!(
            "enqueueing block nonce {} shard {}",
            args.header.nonce(),
            args.header.shard_id()
        );
        let txs_size = compute_size_of_txs(&*self.marshalizer, &args.transaction_pool);
        self.dispatcher
            .add(WorkItem::Block {
                args: Box::new(args),
                txs_size,
            })
            .await;
    }

    pub async fn revert_indexed_block(&self, header: Header, body: Body) {
        trace!("enqueueing revert of block nonce {}", header.nonce());
        self.dispatcher
            .add(WorkItem::RemoveBlock { header, body })
            .await;
    }

    pub async fn save_rounds_info(&self, rounds: Vec<RoundInfo>) {
        self.dispatcher.add(WorkItem::Rounds(rounds)).await;
    }

    /// One work item per shard, matching the per-shard validators index
    /// documents.
    pub async fn save_validators_pub_keys(
        &self,
        validators_pub_keys: HashMap<u32, Vec<Vec<u8>>>,
        epoch: u32,
    ) {
        for (shard_id, pub_keys) in validators_pub_keys {
            self.dispatcher
                .add(WorkItem::ValidatorsPubKeys {
                    shard_id,
                    epoch,
                    pub_keys,
                })
                .await;
        }
    }

    pub async fn save_validators_rating(&self, index: String, ratings: Vec<ValidatorRatingInfo>) {
        self.dispatcher
            .add(WorkItem::Rating { index, ratings })
            .await;
    }

    pub async fn save_accounts(
        &self,
        timestamp: u64,
        accounts: Vec<AlteredAccount>,
        shard_id: u32,
    ) {
        self.dispatcher
            .add(WorkItem::Accounts {
                timestamp,
                accounts,
                shard_id,
            })
            .await;
    }

    /// Finality notifications carry nothing the indices need.
    pub fn finalized_block(&self, _header_hash: &[u8]) {}

    pub async fn close(&self) -> anyhow::Result<()> {
        self.dispatcher.close().await
    }
}

/// The bulk-marshalled size of the whole transactions pool, stored on the
/// block document next to the block's own size.
pub fn compute_size_of_txs(marshalizer: &dyn Marshalizer, pool: &Pool) -> usize {
    let mut size = 0;
    for info in pool.txs.values() {
        size += marshalizer.marshal(&info.tx).map(|b| b.len()).unwrap_or(0);
    }
    for info in pool.invalid.values() {
        size += marshalizer.marshal(&info.tx).map(|b| b.len()).unwrap_or(0);
    }
    for info in pool.rewards.values() {
        size += marshalizer.marshal(&info.tx).map(|b| b.len()).unwrap_or(0);
    }
    for info in pool.scrs.values() {
        size += marshalizer.marshal(&info.tx).map(|b| b.len()).unwrap_or(0);
    }
    for info in pool.receipts.values() {
        size += marshalizer.marshal(&info.tx).map(|b| b.len()).unwrap_or(0);
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        chain::{Transaction, TxInfo},
        marshal::JsonMarshalizer,
    };

    #[test]
    fn pool_size_sums_every_kind() {
        let marshalizer = JsonMarshalizer;
        let mut pool = Pool::default();
        assert_eq!(compute_size_of_txs(&marshalizer, &pool), 0);

        pool.txs
            .insert("aa".to_string(), TxInfo::new(Transaction::default()));
        pool.invalid
            .insert("bb".to_string(), TxInfo::new(Transaction::default()));

        let size = compute_size_of_txs(&marshalizer, &pool);
        assert!(size > 0);
        assert_eq!(size % 2, 0); // two identical default transactions
    }
}
