use std::{collections::HashMap, sync::Arc};

use crate::{
    chain::{Header, MiniBlock, Pool},
    constants::{TX_STATUS_INVALID, TX_STATUS_PENDING, TX_STATUS_SUCCESS},
    data::{Receipt, Transaction},
    hashing::Hasher,
    marshal::{calculate_hash, Marshalizer},
};

use super::builder::TxBuilder;

/// Groups the pool entries of one miniblock into transaction documents,
/// honoring the header-declared processed window and the import-DB filter.
pub(crate) struct TxsGrouper {
    builder: Arc<TxBuilder>,
    hasher: Arc<dyn Hasher>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl TxsGrouper {
    pub fn new(
        builder: Arc<TxBuilder>,
        hasher: Arc<dyn Hasher>,
        marshalizer: Arc<dyn Marshalizer>,
    ) -> Self {
        TxsGrouper {
            builder,
            hasher,
            marshalizer,
        }
    }

    pub fn group_normal_txs(
        &self,
        mb_index: usize,
        miniblock: &MiniBlock,
        header: &Header,
        pool: &Pool,
        is_import_db: bool,
    ) -> anyhow::Result<HashMap<String, Transaction>> {
        let mb_hash = hex::encode(calculate_hash(
            &*self.marshalizer,
            &*self.hasher,
            miniblock,
        )?);

        let self_shard = header.shard_id();
        let status = compute_status(self_shard, miniblock.receiver_shard_id);
        let mut transactions = HashMap::new();
        for tx_hash in extract_executed_tx_hashes(mb_index, &miniblock.tx_hashes, header) {
            let tx_hash_hex = hex::encode(tx_hash);
            let Some(info) = pool.txs.get(&tx_hash_hex) else {
                continue;
            };

            if should_index(miniblock.receiver_shard_id, is_import_db, self_shard) {
                let doc = self.builder.prepare_transaction(
                    &info.tx,
                    &tx_hash_hex,
                    &mb_hash,
                    miniblock,
                    header,
                    status,
                );
                transactions.insert(tx_hash_hex, doc);
            }
        }

        Ok(transactions)
    }

    pub fn group_rewards_txs(
        &self,
        mb_index: usize,
        miniblock: &MiniBlock,
        header: &Header,
        pool: &Pool,
        is_import_db: bool,
    ) -> anyhow::Result<HashMap<String, Transaction>> {
        let mb_hash = hex::encode(calculate_hash(
            &*self.marshalizer,
            &*self.hasher,
            miniblock,
        )?);

        let self_shard = header.shard_id();
        let status = compute_status(self_shard, miniblock.receiver_shard_id);
        let mut rewards = HashMap::new();
        for tx_hash in extract_executed_tx_hashes(mb_index, &miniblock.tx_hashes, header) {
            let tx_hash_hex = hex::encode(tx_hash);
            let Some(info) = pool.rewards.get(&tx_hash_hex) else {
                continue;
            };

            if should_index(miniblock.receiver_shard_id, is_import_db, self_shard) {
                let doc = self.builder.prepare_reward_transaction(
                    &info.tx,
                    &tx_hash_hex,
                    &mb_hash,
                    miniblock,
                    header,
                    status,
                );
                rewards.insert(tx_hash_hex, doc);
            }
        }

        Ok(rewards)
    }

    /// Invalid transactions burn the whole gas limit; they are indexed on
    /// the source shard regardless of the import-DB filter.
    pub fn group_invalid_txs(
        &self,
        mb_index: usize,
        miniblock: &MiniBlock,
        header: &Header,
        pool: &Pool,
    ) -> anyhow::Result<HashMap<String, Transaction>> {
        let mb_hash = hex::encode(calculate_hash(
            &*self.marshalizer,
            &*self.hasher,
            miniblock,
        )?);

        let mut transactions = HashMap::new();
        for tx_hash in extract_executed_tx_hashes(mb_index, &miniblock.tx_hashes, header) {
            let tx_hash_hex = hex::encode(tx_hash);
            let Some(info) = pool.invalid.get(&tx_hash_hex) else {
                continue;
            };

            let mut doc = self.builder.prepare_transaction(
                &info.tx,
                &tx_hash_hex,
                &mb_hash,
                miniblock,
                header,
                TX_STATUS_INVALID,
            );
            doc.gas_used = doc.gas_limit;
            doc.fee = self
                .builder
                .compute_fee_for_gas_used(&info.tx, doc.gas_limit)
                .to_string();
            transactions.insert(tx_hash_hex, doc);
        }

        Ok(transactions)
    }

    pub fn group_receipts(&self, header: &Header, pool: &Pool) -> Vec<Receipt> {
        pool.receipts
            .iter()
            .map(|(hash, info)| self.builder.prepare_receipt(hash, &info.tx, header))
            .collect()
    }
}

/// Only positions within the header's `[first, last]` processed window are
/// projected for this block; a miniblock with no header entry keeps all.
pub(crate) fn extract_executed_tx_hashes<'a>(
    mb_index: usize,
    tx_hashes: &'a [Vec<u8>],
    header: &Header,
) -> Vec<&'a Vec<u8>> {
    let Some(mb_header) = header.miniblock_headers().get(mb_index) else {
        return tx_hashes.iter().collect();
    };

    let first = mb_header.index_of_first_tx_processed;
    let last = mb_header.index_of_last_tx_processed;
    tx_hashes
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx as i32 >= first && *idx as i32 <= last)
        .map(|(_, hash)| hash)
        .collect()
}

pub(crate) fn should_index(destination_shard: u32, is_import_db: bool, self_shard: u32) -> bool {
    if !is_import_db {
        return true;
    }
    self_shard == destination_shard
}

pub(crate) fn compute_status(self_shard: u32, receiver_shard: u32) -> &'static str {
    if self_shard == receiver_shard {
        TX_STATUS_SUCCESS
    } else {
        TX_STATUS_PENDING
    }
}
