mod delegators;
mod fungible;
mod issue;
mod nft_updates;
mod nfts;
mod roles;
mod sc_deploys;
mod serialize;

use std::{collections::HashMap, sync::Arc};

use crate::{
    address::PubkeyConverter,
    chain::{Event, TxLog},
    constants::{METACHAIN_SHARD_ID, SIGNAL_ERROR_IDENTIFIER, TX_STATUS_FAIL, TX_STATUS_SUCCESS, WRITE_LOG_IDENTIFIER},
    data::{
        Delegator, EventDoc, Logs, NftDataUpdate, PreparedResults, ScDeployInfo, TokenInfo,
        TokenRolesAndProperties, TokensInfo,
    },
    fees::FeesProcessor,
    hashing::Hasher,
    marshal::Marshalizer,
    process::tags::TagsCount,
};

use delegators::DelegatorsProcessor;
use fungible::FungibleEsdtProcessor;
use issue::EsdtIssueProcessor;
use nft_updates::NftUpdatesProcessor;
use nfts::NftsProcessor;
use roles::RolesProcessor;
use sc_deploys::ScDeploysProcessor;

/// Everything extracted from one block's logs: token lifecycle records,
/// deploys, delegator positions, tag counters and NFT metadata updates.
#[derive(Default)]
pub struct PreparedLogsResults {
    pub tokens: TokensInfo,
    pub tokens_supply: TokensInfo,
    pub tags: TagsCount,
    pub sc_deploys: HashMap<String, ScDeployInfo>,
    pub delegators: HashMap<String, Delegator>,
    pub tokens_info: Vec<TokenInfo>,
    pub nfts_data_updates: Vec<NftDataUpdate>,
    pub token_roles_and_properties: TokenRolesAndProperties,
}

pub(crate) struct EventContext<'a> {
    pub tx_hash_hex: &'a str,
    pub log_address: &'a [u8],
    pub timestamp: u64,
    pub self_shard_id: u32,
    pub number_of_shards: u32,
}

/// What one chain link reports back: whether the event is handled, and the
/// token movement to fold into the owning transaction or SCR.
#[derive(Debug, Default)]
pub(crate) struct EventOutcome {
    pub processed: bool,
    pub identifier: Option<String>,
    pub value: Option<String>,
    pub receiver: Option<String>,
    pub receiver_shard_id: Option<u32>,
}

pub(crate) trait EventProcessor: Send + Sync {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome;
}

pub struct LogsAndEventsProcessor {
    converter: Arc<dyn PubkeyConverter>,
    fees: Arc<FeesProcessor>,
    shard_processors: Vec<Box<dyn EventProcessor>>,
    meta_processors: Vec<Box<dyn EventProcessor>>,
}

impl LogsAndEventsProcessor {
    pub fn new(
        converter: Arc<dyn PubkeyConverter>,
        marshalizer: Arc<dyn Marshalizer>,
        hasher: Arc<dyn Hasher>,
        fees: Arc<FeesProcessor>,
        balance_converter: Arc<crate::converters::BalanceConverter>,
    ) -> Self {
        let shard_processors: Vec<Box<dyn EventProcessor>> = vec![
            Box::new(FungibleEsdtProcessor::new(converter.clone())),
            Box::new(NftsProcessor::new(converter.clone(), marshalizer)),
            Box::new(NftUpdatesProcessor::new()),
            Box::new(ScDeploysProcessor::new(converter.clone())),
        ];
        let meta_processors: Vec<Box<dyn EventProcessor>> = vec![
            Box::new(EsdtIssueProcessor::new(converter.clone())),
            Box::new(RolesProcessor::new(converter.clone())),
            Box::new(DelegatorsProcessor::new(
                converter.clone(),
                balance_converter,
                hasher,
            )),
        ];

        LogsAndEventsProcessor {
            converter,
            fees,
            shard_processors,
            meta_processors,
        }
    }

    /// Walks every log, attaches the prepared document to its owning tx or
    /// SCR, and runs each event through the processor chain.
    pub fn extract_data_from_logs(
        &self,
        logs: &HashMap<String, TxLog>,
        prepared: &mut PreparedResults,
        timestamp: u64,
        self_shard_id: u32,
        number_of_shards: u32,
    ) -> PreparedLogsResults {
        let mut results = PreparedLogsResults::default();

        let tx_positions: HashMap<String, usize> = prepared
            .transactions
            .iter()
            .enumerate()
            .map(|(idx, tx)| (tx.hash.clone(), idx))
            .collect();
        let scr_positions: HashMap<String, usize> = prepared
            .scrs
            .iter()
            .enumerate()
            .map(|(idx, scr)| (scr.hash.clone(), idx))
            .collect();

        for (log_hash, log) in logs {
            let log_doc = self.prepare_log_for_db(log_hash, log, timestamp);
            if let Some(idx) = tx_positions.get(log_hash) {
                prepared.transactions[*idx].logs.push(log_doc.clone());
            }
            if let Some(idx) = scr_positions.get(log_hash) {
                prepared.scrs[*idx].logs.push(log_doc);
            }

            for event in &log.events {
                let context = EventContext {
                    tx_hash_hex: log_hash,
                    log_address: &log.address,
                    timestamp,
                    self_shard_id,
                    number_of_shards,
                };
                self.process_event(
                    event,
                    &context,
                    prepared,
                    &tx_positions,
                    &scr_positions,
                    &mut results,
                );
            }
        }

        results
    }

    #[allow(clippy::too_many_arguments)]
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        prepared: &mut PreparedResults,
        tx_positions: &HashMap<String, usize>,
        scr_positions: &HashMap<String, usize>,
        results: &mut PreparedLogsResults,
    ) {
        if self.apply_informative_event(event, context, prepared, tx_positions) {
            return;
        }

        let is_meta = context.self_shard_id == METACHAIN_SHARD_ID;
        let chain = self.shard_processors.iter().chain(
            is_meta
                .then_some(self.meta_processors.iter())
                .into_iter()
                .flatten(),
        );

        for processor in chain {
            let outcome = processor.process_event(event, context, results);
            let empty_identifier = outcome.identifier.is_none();
            if empty_identifier && outcome.processed {
                return;
            }

            if let Some(idx) = tx_positions.get(context.tx_hash_hex) {
                if !empty_identifier {
                    let tx = &mut prepared.transactions[*idx];
                    tx.has_operations = true;
                    tx.tokens.push(outcome.identifier.clone().unwrap_or_default());
                    tx.esdt_values.push(outcome.value.clone().unwrap_or_default());
                    tx.receivers.push(outcome.receiver.clone().unwrap_or_default());
                    tx.receivers_shard_ids
                        .push(outcome.receiver_shard_id.unwrap_or_default());
                    continue;
                }
            }

            if let Some(idx) = scr_positions.get(context.tx_hash_hex) {
                if !empty_identifier {
                    let scr = &mut prepared.scrs[*idx];
                    scr.has_operations = true;
                    scr.tokens.push(outcome.identifier.clone().unwrap_or_default());
                    scr.esdt_values.push(outcome.value.clone().unwrap_or_default());
                    scr.receivers.push(outcome.receiver.clone().unwrap_or_default());
                    scr.receivers_shard_ids
                        .push(outcome.receiver_shard_id.unwrap_or_default());
                    return;
                }
            }

            if outcome.processed {
                return;
            }
        }
    }

    /// `writeLog` forces success and `signalError` failure, both charging
    /// the full gas limit; applied after the SCR passes.
    fn apply_informative_event(
        &self,
        event: &Event,
        context: &EventContext,
        prepared: &mut PreparedResults,
        tx_positions: &HashMap<String, usize>,
    ) -> bool {
        let status = match event.identifier_str() {
            WRITE_LOG_IDENTIFIER => TX_STATUS_SUCCESS,
            SIGNAL_ERROR_IDENTIFIER => TX_STATUS_FAIL,
            _ => return false,
        };

        if let Some(idx) = tx_positions.get(context.tx_hash_hex) {
            let tx = &mut prepared.transactions[*idx];
            tx.status = status.to_string();
            tx.gas_used = tx.gas_limit;
            tx.fee = self
                .fees
                .compute_tx_fee_based_on_gas_used(tx.gas_price, &tx.data, tx.gas_limit)
                .to_string();
        }

        true
    }

    /// Builds the standalone log documents for the logs index.
    pub fn prepare_logs_for_db(
        &self,
        logs: &HashMap<String, TxLog>,
        timestamp: u64,
    ) -> Vec<Logs> {
        logs.iter()
            .map(|(hash, log)| self.prepare_log_for_db(hash, log, timestamp))
            .collect()
    }

    fn prepare_log_for_db(&self, id: &str, log: &TxLog, timestamp: u64) -> Logs {
        Logs {
            id: id.to_string(),
            address: self.converter.encode(&log.address),
            timestamp,
            events: log
                .events
                .iter()
                .map(|event| EventDoc {
                    address: self.converter.encode(&event.address),
                    identifier: event.identifier_str().to_string(),
                    topics: event.topics.clone(),
                    data: event.data.clone(),
                    additional_data: event.additional_data.clone(),
                })
                .collect(),
        }
    }

    /// Delegator rows written at the reverted block's timestamp are dropped
    /// by an update-by-query when a metachain block is rolled back.
    pub fn prepare_delegators_query_in_case_of_revert(&self, timestamp: u64) -> serde_json::Value {
        serde_json::json!({
            "query": {
                "match": {
                    "timestamp": {"query": timestamp, "operator": "AND"}
                }
            },
            "script": {
                "source": "ctx.op = 'delete'",
                "lang": "painless"
            }
        })
    }
}
