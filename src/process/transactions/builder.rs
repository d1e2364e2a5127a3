use std::sync::Arc;

use crate::{
    address::{is_smart_contract_address, PubkeyConverter},
    chain::{self, Header, MiniBlock},
    data::{Receipt, ScResult, Transaction},
    fees::FeesProcessor,
    sharding::compute_shard_id,
};

/// Builds per-index documents out of pool entries. Gas-used and fee start at
/// the move-balance values; the SCR and log passes override them.
pub(crate) struct TxBuilder {
    converter: Arc<dyn PubkeyConverter>,
    fees: Arc<FeesProcessor>,
}

impl TxBuilder {
    pub fn new(converter: Arc<dyn PubkeyConverter>, fees: Arc<FeesProcessor>) -> Self {
        TxBuilder { converter, fees }
    }

    pub fn prepare_transaction(
        &self,
        tx: &chain::Transaction,
        tx_hash_hex: &str,
        mb_hash_hex: &str,
        miniblock: &MiniBlock,
        header: &Header,
        status: &str,
    ) -> Transaction {
        let gas_used = self.fees.compute_gas_limit(&tx.data);
        let fee = self
            .fees
            .compute_tx_fee_based_on_gas_used(tx.gas_price, &tx.data, gas_used);

        Transaction {
            hash: tx_hash_hex.to_string(),
            mb_hash: mb_hash_hex.to_string(),
            nonce: tx.nonce,
            round: header.round(),
            value: tx.value.clone(),
            receiver: self.converter.encode(&tx.receiver),
            sender: self.converter.encode(&tx.sender),
            receiver_shard: miniblock.receiver_shard_id,
            sender_shard: miniblock.sender_shard_id,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            gas_used,
            fee: fee.to_string(),
            data: tx.data.clone(),
            signature: hex::encode(&tx.signature),
            timestamp: header.timestamp(),
            status: status.to_string(),
            sender_username: tx.sender_username.clone(),
            receiver_username: tx.receiver_username.clone(),
            is_sc_call: is_smart_contract_address(&tx.receiver),
            receiver_address_bytes: tx.receiver.clone(),
            ..Default::default()
        }
    }

    pub fn compute_fee_for_gas_used(&self, tx: &chain::Transaction, gas_used: u64) -> u128 {
        self.fees
            .compute_tx_fee_based_on_gas_used(tx.gas_price, &tx.data, gas_used)
    }

    pub fn prepare_reward_transaction(
        &self,
        reward: &chain::RewardTx,
        tx_hash_hex: &str,
        mb_hash_hex: &str,
        miniblock: &MiniBlock,
        header: &Header,
        status: &str,
    ) -> Transaction {
        Transaction {
            hash: tx_hash_hex.to_string(),
            mb_hash: mb_hash_hex.to_string(),
            round: reward.round,
            value: reward.value.clone(),
            receiver: self.converter.encode(&reward.receiver),
            receiver_shard: miniblock.receiver_shard_id,
            sender_shard: miniblock.sender_shard_id,
            fee: "0".to_string(),
            timestamp: header.timestamp(),
            status: status.to_string(),
            receiver_address_bytes: reward.receiver.clone(),
            ..Default::default()
        }
    }

    pub fn prepare_receipt(
        &self,
        receipt_hash_hex: &str,
        receipt: &chain::ReceiptData,
        header: &Header,
    ) -> Receipt {
        Receipt {
            hash: receipt_hash_hex.to_string(),
            value: receipt.value.clone(),
            sender: self.converter.encode(&receipt.sender),
            data: String::from_utf8_lossy(&receipt.data).into_owned(),
            tx_hash: hex::encode(&receipt.tx_hash),
            timestamp: header.timestamp(),
        }
    }

    pub fn prepare_scr(
        &self,
        scr_hash_hex: &str,
        scr: &chain::Scr,
        mb_hash_hex: &str,
        header: &Header,
        number_of_shards: u32,
    ) -> ScResult {
        let relayer_addr = if scr.relayer_addr.is_empty() {
            String::new()
        } else {
            self.converter.encode(&scr.relayer_addr)
        };
        let original_sender = if scr.original_sender.is_empty() {
            String::new()
        } else {
            self.converter.encode(&scr.original_sender)
        };

        ScResult {
            hash: scr_hash_hex.to_string(),
            mb_hash: mb_hash_hex.to_string(),
            nonce: scr.nonce,
            gas_limit: scr.gas_limit,
            gas_price: scr.gas_price,
            value: scr.value.clone(),
            sender: self.converter.encode(&scr.sender),
            receiver: self.converter.encode(&scr.receiver),
            sender_shard: compute_shard_id(&scr.sender, number_of_shards),
            receiver_shard: compute_shard_id(&scr.receiver, number_of_shards),
            relayer_addr,
            relayed_value: scr.relayed_value.clone(),
            code: String::from_utf8_lossy(&scr.code).into_owned(),
            data: scr.data.clone(),
            prev_tx_hash: hex::encode(&scr.prev_tx_hash),
            original_tx_hash: hex::encode(&scr.original_tx_hash),
            call_type: scr.call_type.to_string(),
            code_metadata: scr.code_metadata.clone(),
            return_message: String::from_utf8_lossy(&scr.return_message).into_owned(),
            timestamp: header.timestamp(),
            original_sender,
            ..Default::default()
        }
    }
}
