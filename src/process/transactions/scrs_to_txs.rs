use std::{collections::HashMap, sync::Arc};

use crate::{
    constants::{
        AT_SEPARATOR, ESDT_NFT_TRANSFER, MIN_NUM_ARGUMENTS_NFT_TRANSFER, MULTI_ESDT_NFT_TRANSFER,
        OK_HEX_MARKER, OK_PLAIN_MARKER, RELAYED_TX_PREFIX, RELAYED_TX_V2_PREFIX, TX_STATUS_FAIL,
        TX_STATUS_INVALID, USER_ERROR_MESSAGE,
    },
    data::{RefundData, ScResult, Transaction},
    fees::FeesProcessor,
};

/// Correlates smart-contract results with their root transactions and folds
/// the outcome back into status, gas-used and fee.
pub(crate) struct ScrsDataToTransactions {
    fees: Arc<FeesProcessor>,
}

impl ScrsDataToTransactions {
    pub fn new(fees: Arc<FeesProcessor>) -> Self {
        ScrsDataToTransactions { fees }
    }

    /// First pass: attach every SCR whose `originalTxHash` lives in the
    /// current block; the rest are returned as orphans.
    pub fn attach_scrs_to_transactions_and_return_scrs_without_tx(
        &self,
        txs: &mut HashMap<String, Transaction>,
        scrs: &[ScResult],
    ) -> Vec<ScResult> {
        let mut orphans = Vec::new();
        for scr in scrs {
            match txs.get_mut(&scr.original_tx_hash) {
                Some(tx) => self.add_scr_info_into_tx(scr, tx),
                None => orphans.push(scr.clone()),
            }
        }
        orphans
    }

    fn add_scr_info_into_tx(&self, scr: &ScResult, tx: &mut Transaction) {
        tx.smart_contract_results.push(scr.clone());

        // invalid transactions already carry their final status and gas
        if tx.status == TX_STATUS_INVALID {
            return;
        }

        if is_scr_for_sender_with_refund(scr, tx) {
            let refund = scr.value.parse::<u128>().unwrap_or(0);
            let (gas_used, fee) = self.fees.compute_gas_used_and_fee_based_on_refund_value(
                tx.gas_limit,
                tx.gas_price,
                &tx.data,
                refund,
            );
            tx.gas_used = gas_used;
            tx.fee = fee.to_string();
        }
    }

    /// Second pass: settle status, gas-used and fee for every transaction
    /// that collected at least one SCR.
    pub fn process_transactions_after_scrs_were_attached(
        &self,
        txs: &mut HashMap<String, Transaction>,
    ) {
        for tx in txs.values_mut() {
            if tx.smart_contract_results.is_empty() {
                continue;
            }
            self.fill_tx_with_scrs_fields(tx);
        }
    }

    fn fill_tx_with_scrs_fields(&self, tx: &mut Transaction) {
        tx.has_scr = true;

        if is_relayed_tx(tx) {
            self.charge_full_gas(tx);
            return;
        }

        if tx.status == TX_STATUS_INVALID {
            return;
        }

        if has_successful_scrs(tx) {
            return;
        }

        if has_cross_shard_pending_transfer(tx) {
            self.charge_full_gas(tx);
            return;
        }

        tx.status = TX_STATUS_FAIL.to_string();
        self.charge_full_gas(tx);
    }

    fn charge_full_gas(&self, tx: &mut Transaction) {
        tx.gas_used = tx.gas_limit;
        tx.fee = self
            .fees
            .compute_tx_fee_based_on_gas_used(tx.gas_price, &tx.data, tx.gas_limit)
            .to_string();
    }

    /// Orphan SCRs still carry information for transactions owned by other
    /// shards or earlier blocks: failed NFT transfers map to a status
    /// correction, refunds to a fee correction resolved against the store.
    pub fn process_scrs_without_tx(
        &self,
        scrs: &[ScResult],
    ) -> (HashMap<String, String>, HashMap<String, RefundData>) {
        let mut tx_hash_status = HashMap::new();
        let mut tx_hash_refund = HashMap::new();

        for scr in scrs {
            let data = String::from_utf8_lossy(&scr.data);
            if is_esdt_nft_transfer_with_user_error(&data) {
                tx_hash_status.insert(scr.original_tx_hash.clone(), TX_STATUS_FAIL.to_string());
                continue;
            }

            if is_refund_scr(&data, &scr.value) {
                tx_hash_refund.insert(
                    scr.original_tx_hash.clone(),
                    RefundData {
                        value: scr.value.clone(),
                        receiver: scr.receiver.clone(),
                    },
                );
            }
        }

        (tx_hash_status, tx_hash_refund)
    }
}

fn is_scr_for_sender_with_refund(scr: &ScResult, tx: &Transaction) -> bool {
    let is_for_sender = scr.receiver == tx.sender;
    let is_right_nonce = scr.nonce == tx.nonce + 1;
    let is_data_ok = scr.data.starts_with(OK_HEX_MARKER.as_bytes());

    is_for_sender && is_right_nonce && is_data_ok
}

fn is_relayed_tx(tx: &Transaction) -> bool {
    tx.data.starts_with(RELAYED_TX_PREFIX.as_bytes())
        || tx.data.starts_with(RELAYED_TX_V2_PREFIX.as_bytes())
}

fn has_successful_scrs(tx: &Transaction) -> bool {
    tx.smart_contract_results
        .iter()
        .any(|scr| is_scr_successful(&scr.data))
}

fn is_scr_successful(data: &[u8]) -> bool {
    let data = String::from_utf8_lossy(data);
    data.contains(OK_HEX_MARKER) || data.contains(OK_PLAIN_MARKER)
}

fn has_cross_shard_pending_transfer(tx: &Transaction) -> bool {
    for scr in &tx.smart_contract_results {
        let data = String::from_utf8_lossy(&scr.data);
        let parts: Vec<&str> = data.split(AT_SEPARATOR).collect();
        if parts.len() < 2 {
            return false;
        }

        let is_transfer = parts[0] == ESDT_NFT_TRANSFER || parts[0] == MULTI_ESDT_NFT_TRANSFER;
        if !is_transfer {
            return false;
        }

        if scr.sender_shard != scr.receiver_shard {
            return true;
        }
    }

    false
}

/// An `ESDTNFTTransfer`/`MultiESDTNFTTransfer` SCR whose trailing argument
/// is the hex of "user error". Only the final token is examined, so an SCR
/// carrying both an `@ok` and the error suffix still classifies as failed.
fn is_esdt_nft_transfer_with_user_error(data: &str) -> bool {
    let parts: Vec<&str> = data.split(AT_SEPARATOR).collect();
    let is_transfer = parts[0] == ESDT_NFT_TRANSFER || parts[0] == MULTI_ESDT_NFT_TRANSFER;
    if !is_transfer || parts.len() < MIN_NUM_ARGUMENTS_NFT_TRANSFER {
        return false;
    }

    parts[parts.len() - 1] == hex::encode(USER_ERROR_MESSAGE)
}

fn is_refund_scr(data: &str, value: &str) -> bool {
    data.starts_with(OK_HEX_MARKER) && value.parse::<u128>().map(|v| v > 0).unwrap_or(false)
}
