use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use serde_json::{json, Value};

use elastic_indexer::{
    address::new_address_converter,
    client::DatabaseClient,
    config::EconomicsConfig,
    constants::ALL_INDICES,
    converters::BalanceConverter,
    fees::FeesProcessor,
    hashing::new_hasher,
    marshal::new_marshalizer,
    process::{
        accounts::AccountsProcessor,
        block::BlockProcessor,
        elastic::{ElasticProcessor, ElasticProcessorArgs},
        logsevents::LogsAndEventsProcessor,
        miniblocks::MiniblocksProcessor,
        operations::OperationsProcessor,
        statistics::StatisticsProcessor,
        transactions::TransactionsProcessor,
        validators::ValidatorsProcessor,
    },
};

/// Captures every request the write layer issues, and answers multi-gets
/// with canned per-index responses.
#[derive(Default)]
pub struct StubClient {
    pub bulks: Mutex<Vec<(String, String)>>,
    pub removals: Mutex<Vec<(String, Value)>>,
    pub updates_by_query: Mutex<Vec<(String, Value)>>,
    pub multi_get_responses: Mutex<HashMap<String, Value>>,
}

impl StubClient {
    pub fn new() -> Arc<Self> {
        Arc::new(StubClient::default())
    }

    pub fn set_multi_get_response(&self, index: &str, response: Value) {
        self.multi_get_responses
            .lock()
            .unwrap()
            .insert(index.to_string(), response);
    }

    /// All captured bulk NDJSON joined, for content assertions.
    pub fn all_bulk_content(&self) -> String {
        self.bulks
            .lock()
            .unwrap()
            .iter()
            .map(|(_, buffer)| buffer.clone())
            .collect::<Vec<_>>()
            .join("")
    }

    /// The payload line following the first meta line containing `needle`.
    pub fn payload_after_meta(&self, needle: &str) -> Option<Value> {
        let content = self.all_bulk_content();
        let lines: Vec<&str> = content.lines().collect();
        for (idx, line) in lines.iter().enumerate() {
            if line.contains(needle) {
                return lines.get(idx + 1).and_then(|l| serde_json::from_str(l).ok());
            }
        }
        None
    }

    pub fn meta_lines_containing(&self, needle: &str) -> Vec<String> {
        self.all_bulk_content()
            .lines()
            .filter(|line| line.contains(needle))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl DatabaseClient for StubClient {
    async fn do_bulk_request(&self, index: &str, buffer: &str) -> anyhow::Result<()> {
        self.bulks
            .lock()
            .unwrap()
            .push((index.to_string(), buffer.to_string()));
        Ok(())
    }

    async fn do_multi_get(
        &self,
        ids: &[String],
        index: &str,
        _with_source: bool,
    ) -> anyhow::Result<Value> {
        if let Some(response) = self.multi_get_responses.lock().unwrap().get(index) {
            return Ok(response.clone());
        }

        let docs: Vec<Value> = ids
            .iter()
            .map(|id| json!({"_id": id, "found": false}))
            .collect();
        Ok(json!({ "docs": docs }))
    }

    async fn do_query_remove(&self, index: &str, query: Value) -> anyhow::Result<()> {
        self.removals
            .lock()
            .unwrap()
            .push((index.to_string(), query));
        Ok(())
    }

    async fn do_update_by_query(&self, index: &str, body: Value) -> anyhow::Result<()> {
        self.updates_by_query
            .lock()
            .unwrap()
            .push((index.to_string(), body));
        Ok(())
    }

    async fn check_and_create_template(&self, _: &str, _: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn check_and_create_policy(&self, _: &str, _: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn check_and_create_index(&self, _: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn check_and_create_alias(&self, _: &str, _: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn economics() -> EconomicsConfig {
    EconomicsConfig {
        denomination: 18,
        min_gas_limit: 50_000,
        gas_per_data_byte: 1_500,
        gas_price_modifier: 0.01,
    }
}

/// An elastic processor with every index enabled, wired to the stub client.
pub async fn create_elastic_processor(client: Arc<StubClient>) -> ElasticProcessor {
    let marshalizer = new_marshalizer("json").unwrap();
    let hasher = new_hasher("blake2b").unwrap();
    let converter = new_address_converter(32, "");
    let balance_converter = Arc::new(BalanceConverter::new(18));
    let fees = Arc::new(FeesProcessor::new(&economics()));

    let enabled: HashSet<String> = ALL_INDICES.iter().map(|index| index.to_string()).collect();

    ElasticProcessor::new(ElasticProcessorArgs {
        bulk_request_max_size: 1 << 20,
        use_kibana: false,
        index_templates: HashMap::new(),
        index_policies: HashMap::new(),
        enabled_indexes: enabled,
        client,
        block_proc: BlockProcessor::new(hasher.clone(), marshalizer.clone()),
        miniblocks_proc: MiniblocksProcessor::new(hasher.clone(), marshalizer.clone()),
        transactions_proc: TransactionsProcessor::new(
            converter.clone(),
            hasher.clone(),
            marshalizer.clone(),
            fees.clone(),
        ),
        accounts_proc: AccountsProcessor::new(converter.clone(), balance_converter.clone()),
        logs_proc: LogsAndEventsProcessor::new(
            converter.clone(),
            marshalizer,
            hasher,
            fees.clone(),
            balance_converter,
        ),
        operations_proc: OperationsProcessor::new(),
        statistics_proc: StatisticsProcessor::new(),
        validators_proc: ValidatorsProcessor::new(new_address_converter(96, "")),
        fees,
    })
    .await
    .expect("processor construction")
}
