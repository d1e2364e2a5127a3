use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::json;

use crate::{
    chain::{AlteredAccount, Body, Header, SaveBlockData},
    client::{hashes_query, DatabaseClient},
    constants::*,
    data::{
        BufferSlice, FeeData, RefundData, RoundInfo, Transaction, TokensInfo,
        ValidatorRatingInfo,
    },
    errors::IndexerError,
    fees::FeesProcessor,
    process::{
        accounts::{AccountsProcessor, RegularAccount},
        block::BlockProcessor,
        logsevents::LogsAndEventsProcessor,
        miniblocks::MiniblocksProcessor,
        operations::OperationsProcessor,
        statistics::StatisticsProcessor,
        tags::TagsCount,
        transactions::TransactionsProcessor,
        validators::ValidatorsProcessor,
    },
};

/// The coarse operations the dispatcher drives. The trait seam keeps work
/// items testable against a stub processor.
#[async_trait]
pub trait ElasticProcessorHandler: Send + Sync {
    async fn save_header(&self, args: &SaveBlockData, txs_size: usize) -> anyhow::Result<()>;
    async fn save_miniblocks(&self, header: &Header, body: &Body) -> anyhow::Result<()>;
    async fn save_transactions(&self, args: &SaveBlockData) -> anyhow::Result<()>;
    async fn save_accounts(
        &self,
        timestamp: u64,
        accounts: &[AlteredAccount],
        shard_id: u32,
    ) -> anyhow::Result<()>;
    async fn save_rounds_info(&self, rounds: &[RoundInfo]) -> anyhow::Result<()>;
    async fn save_validators_rating(
        &self,
        index: &str,
        ratings: &[ValidatorRatingInfo],
    ) -> anyhow::Result<()>;
    async fn save_shard_validators_pub_keys(
        &self,
        shard_id: u32,
        epoch: u32,
        pub_keys: &[Vec<u8>],
    ) -> anyhow::Result<()>;
    async fn remove_header(&self, header: &Header) -> anyhow::Result<()>;
    async fn remove_miniblocks(&self, header: &Header, body: &Body) -> anyhow::Result<()>;
    async fn remove_transactions(&self, header: &Header, body: &Body) -> anyhow::Result<()>;
    async fn remove_accounts_esdt(&self, timestamp: u64, shard_id: u32) -> anyhow::Result<()>;
}

pub struct ElasticProcessorArgs {
    pub bulk_request_max_size: usize,
    pub use_kibana: bool,
    pub index_templates: HashMap<String, Vec<u8>>,
    pub index_policies: HashMap<String, Vec<u8>>,
    pub enabled_indexes: HashSet<String>,
    pub client: Arc<dyn DatabaseClient>,
    pub block_proc: BlockProcessor,
    pub miniblocks_proc: MiniblocksProcessor,
    pub transactions_proc: TransactionsProcessor,
    pub accounts_proc: AccountsProcessor,
    pub logs_proc: LogsAndEventsProcessor,
    pub operations_proc: OperationsProcessor,
    pub statistics_proc: StatisticsProcessor,
    pub validators_proc: ValidatorsProcessor,
    pub fees: Arc<FeesProcessor>,
}

/// Orchestrates the sub-processors: every operation prepares documents,
/// assembles bulk buffers and submits them through the DB client.
pub struct ElasticProcessor {
    bulk_request_max_size: usize,
    enabled_indexes: HashSet<String>,
    client: Arc<dyn DatabaseClient>,
    block_proc: BlockProcessor,
    miniblocks_proc: MiniblocksProcessor,
    transactions_proc: TransactionsProcessor,
    accounts_proc: AccountsProcessor,
    logs_proc: LogsAndEventsProcessor,
    operations_proc: OperationsProcessor,
    statistics_proc: StatisticsProcessor,
    validators_proc: ValidatorsProcessor,
    fees: Arc<FeesProcessor>,
}

impl ElasticProcessor {
    pub async fn new(args: ElasticProcessorArgs) -> anyhow::Result<Self> {
        if args.enabled_indexes.is_empty() {
            return Err(IndexerError::EmptyEnabledIndices.into());
        }

        let processor = ElasticProcessor {
            bulk_request_max_size: args.bulk_request_max_size,
            enabled_indexes: args.enabled_indexes,
            client: args.client,
            block_proc: args.block_proc,
            miniblocks_proc: args.miniblocks_proc,
            transactions_proc: args.transactions_proc,
            accounts_proc: args.accounts_proc,
            logs_proc: args.logs_proc,
            operations_proc: args.operations_proc,
            statistics_proc: args.statistics_proc,
            validators_proc: args.validators_proc,
            fees: args.fees,
        };

        processor
            .init(args.use_kibana, &args.index_templates, &args.index_policies)
            .await?;
        Ok(processor)
    }

    /// Create the open-distro template, the per-index templates, the
    /// `<name>-000001` indices and their aliases, in that order.
    async fn init(
        &self,
        use_kibana: bool,
        templates: &HashMap<String, Vec<u8>>,
        policies: &HashMap<String, Vec<u8>>,
    ) -> anyhow::Result<()> {
        if let Some(template) = templates.get(OPEN_DISTRO_TEMPLATE) {
            self.client
                .check_and_create_template(OPEN_DISTRO_TEMPLATE, template)
                .await?;
        }

        if use_kibana {
            for (name, policy) in policies {
                self.client.check_and_create_policy(name, policy).await?;
            }
        }

        for index in ALL_INDICES {
            match templates.get(index) {
                Some(template) => {
                    self.client.check_and_create_template(index, template).await?;
                }
                None => debug!("no template found for index {index}"),
            }
        }

        for index in ALL_INDICES {
            self.client.check_and_create_index(index).await?;
            self.client
                .check_and_create_alias(index, &format!("{index}-{INDEX_SUFFIX}"))
                .await?;
        }

        Ok(())
    }

    fn is_index_enabled(&self, index: &str) -> bool {
        self.enabled_indexes.contains(index)
    }

    async fn do_bulk_requests(&self, index: &str, buffer: &BufferSlice) -> anyhow::Result<()> {
        for chunk in buffer.buffers() {
            if chunk.is_empty() {
                continue;
            }
            self.client.do_bulk_request(index, chunk).await?;
        }
        Ok(())
    }

    /// Which of the given document ids already exist in the index.
    async fn get_existing_obj_map(
        &self,
        ids: &[String],
        index: &str,
    ) -> anyhow::Result<HashMap<String, bool>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let response = self.client.do_multi_get(ids, index, false).await?;
        let mut found = HashMap::new();
        let Some(docs) = response.get("docs").and_then(|docs| docs.as_array()) else {
            return Ok(found);
        };
        for doc in docs {
            if doc.get("error").is_some() {
                continue;
            }
            let (Some(id), Some(is_found)) = (
                doc.get("_id").and_then(|id| id.as_str()),
                doc.get("found").and_then(|found| found.as_bool()),
            ) else {
                continue;
            };
            found.insert(id.to_string(), is_found);
        }
        Ok(found)
    }

    fn index_epoch_info(&self, header: &Header, buffer: &mut BufferSlice) -> anyhow::Result<()> {
        if !self.is_index_enabled(EPOCH_INFO_INDEX) || header.shard_id() != METACHAIN_SHARD_ID {
            return Ok(());
        }
        self.block_proc
            .serialize_epoch_info(header, buffer, EPOCH_INFO_INDEX)
    }

    /// Resolves orphan refunds against already-indexed transactions and
    /// writes the corrected fee/gas in place.
    async fn index_transactions_fee_data(
        &self,
        refunds: &HashMap<String, RefundData>,
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        if refunds.is_empty() {
            return Ok(());
        }

        let ids: Vec<String> = refunds.keys().cloned().collect();
        let response = self.client.do_multi_get(&ids, TRANSACTIONS_INDEX, true).await?;
        let Some(docs) = response.get("docs").and_then(|docs| docs.as_array()) else {
            return Ok(());
        };

        let mut fee_data: HashMap<String, FeeData> = HashMap::new();
        for doc in docs {
            if doc.get("found").and_then(|found| found.as_bool()) != Some(true) {
                continue;
            }
            let Some(id) = doc.get("_id").and_then(|id| id.as_str()) else {
                continue;
            };
            let Some(source) = doc.get("_source") else {
                continue;
            };
            let tx: Transaction = match serde_json::from_value(source.clone()) {
                Ok(tx) => tx,
                Err(err) => {
                    warn!("cannot decode indexed transaction {id}: {err}");
                    continue;
                }
            };
            let Some(refund) = refunds.get(id) else {
                continue;
            };
            if refund.receiver != tx.sender {
                continue;
            }

            let refund_value = refund.value.parse::<u128>().unwrap_or(0);
            let (gas_used, fee) = self.fees.compute_gas_used_and_fee_based_on_refund_value(
                tx.gas_limit,
                tx.gas_price,
                &tx.data,
                refund_value,
            );
            fee_data.insert(
                id.to_string(),
                FeeData {
                    fee: fee.to_string(),
                    gas_used,
                },
            );
        }

        self.transactions_proc
            .serialize_transactions_fee_data(&fee_data, buffer, TRANSACTIONS_INDEX);
        self.transactions_proc
            .serialize_transactions_fee_data(&fee_data, buffer, OPERATIONS_INDEX);
        Ok(())
    }

    async fn index_nft_create_info(
        &self,
        tokens: &mut TokensInfo,
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        if !self.is_index_enabled(TOKENS_INDEX) || tokens.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .do_multi_get(&tokens.get_all_tokens(), TOKENS_INDEX, true)
            .await?;
        tokens.add_type_and_owner_from_response(&response);

        self.logs_proc
            .serialize_nft_create_info(tokens, buffer, TOKENS_INDEX)
    }

    async fn index_nft_burn_info(
        &self,
        tokens_supply: &mut TokensInfo,
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        if !self.is_index_enabled(TOKENS_INDEX) || tokens_supply.is_empty() {
            return Ok(());
        }

        let response = self
            .client
            .do_multi_get(&tokens_supply.get_all_tokens(), TOKENS_INDEX, true)
            .await?;
        tokens_supply.add_type_and_owner_from_response(&response);

        self.logs_proc
            .serialize_supply_data(tokens_supply, buffer, TOKENS_INDEX);
        Ok(())
    }

    async fn index_altered_accounts(
        &self,
        timestamp: u64,
        updates: &[crate::data::NftDataUpdate],
        altered_accounts: &HashMap<String, AlteredAccount>,
        buffer: &mut BufferSlice,
        tags: &mut TagsCount,
        shard_id: u32,
    ) -> anyhow::Result<()> {
        let (regular, esdt) = self.accounts_proc.get_accounts(altered_accounts);
        self.save_regular_accounts(timestamp, &regular, buffer, shard_id)?;

        let (mut accounts_esdt, tokens_data) =
            self.accounts_proc
                .prepare_accounts_map_esdt(timestamp, &esdt, tags, shard_id);
        if !tokens_data.is_empty() {
            let response = self
                .client
                .do_multi_get(&tokens_data.get_all_tokens(), TOKENS_INDEX, true)
                .await?;
            let mut tokens_data = tokens_data;
            tokens_data.add_type_and_owner_from_response(&response);
            tokens_data.put_type_and_owner_in_accounts(&mut accounts_esdt);
        }

        if self.is_index_enabled(ACCOUNTS_ESDT_INDEX) {
            self.accounts_proc.serialize_accounts_esdt(
                &accounts_esdt,
                updates,
                buffer,
                ACCOUNTS_ESDT_INDEX,
            )?;
        }

        if self.is_index_enabled(ACCOUNTS_ESDT_HISTORY_INDEX) {
            let history =
                self.accounts_proc
                    .prepare_accounts_history(timestamp, &accounts_esdt, shard_id);
            self.accounts_proc
                .serialize_accounts_history(&history, buffer, ACCOUNTS_ESDT_HISTORY_INDEX)?;
        }

        Ok(())
    }

    fn save_regular_accounts(
        &self,
        timestamp: u64,
        accounts: &[RegularAccount],
        buffer: &mut BufferSlice,
        shard_id: u32,
    ) -> anyhow::Result<()> {
        let accounts_map =
            self.accounts_proc
                .prepare_regular_accounts_map(timestamp, accounts, shard_id);

        if self.is_index_enabled(ACCOUNTS_INDEX) {
            self.accounts_proc
                .serialize_accounts(&accounts_map, buffer, ACCOUNTS_INDEX)?;
        }

        if self.is_index_enabled(ACCOUNTS_HISTORY_INDEX) {
            let history =
                self.accounts_proc
                    .prepare_accounts_history(timestamp, &accounts_map, shard_id);
            self.accounts_proc
                .serialize_accounts_history(&history, buffer, ACCOUNTS_HISTORY_INDEX)?;
        }

        Ok(())
    }

    async fn update_delegators_in_case_of_revert(
        &self,
        header: &Header,
        body: &Body,
    ) -> anyhow::Result<()> {
        let should_update =
            header.shard_id() == METACHAIN_SHARD_ID && !body.miniblocks.is_empty();
        if !should_update {
            return Ok(());
        }

        let query = self
            .logs_proc
            .prepare_delegators_query_in_case_of_revert(header.timestamp());
        self.client.do_update_by_query(DELEGATORS_INDEX, query).await
    }

    async fn remove_if_hashes_not_empty(
        &self,
        index: &str,
        hashes: Vec<String>,
    ) -> anyhow::Result<()> {
        if hashes.is_empty() {
            return Ok(());
        }
        self.client.do_query_remove(index, hashes_query(&hashes)).await
    }
}

#[async_trait]
impl ElasticProcessorHandler for ElasticProcessor {
    async fn save_header(&self, args: &SaveBlockData, txs_size: usize) -> anyhow::Result<()> {
        if !self.is_index_enabled(BLOCKS_INDEX) {
            return Ok(());
        }

        let block = self.block_proc.prepare_block_for_db(args, txs_size)?;
        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.block_proc
            .serialize_block(&block, &mut buffer, BLOCKS_INDEX)?;
        self.index_epoch_info(&args.header, &mut buffer)?;

        self.do_bulk_requests("", &buffer).await
    }

    async fn save_miniblocks(&self, header: &Header, body: &Body) -> anyhow::Result<()> {
        if !self.is_index_enabled(MINIBLOCKS_INDEX) {
            return Ok(());
        }

        let miniblocks = self.miniblocks_proc.prepare_db_miniblocks(header, body);
        if miniblocks.is_empty() {
            return Ok(());
        }

        let hashes: Vec<String> = miniblocks.iter().map(|mb| mb.hash.clone()).collect();
        let existing = match self.get_existing_obj_map(&hashes, MINIBLOCKS_INDEX).await {
            Ok(existing) => existing,
            Err(err) => {
                warn!("cannot fetch indexed miniblocks: {err}");
                HashMap::new()
            }
        };

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.miniblocks_proc.serialize_bulk_miniblocks(
            &miniblocks,
            &existing,
            &mut buffer,
            MINIBLOCKS_INDEX,
            header.shard_id(),
        );

        self.do_bulk_requests("", &buffer).await
    }

    async fn save_transactions(&self, args: &SaveBlockData) -> anyhow::Result<()> {
        let header = &args.header;
        let timestamp = header.timestamp();
        let self_shard = header.shard_id();

        let mut prepared = self.transactions_proc.prepare_transactions_for_database(
            &args.body,
            header,
            &args.transaction_pool,
            args.is_import_db,
            args.number_of_shards,
        );
        let mut logs_results = self.logs_proc.extract_data_from_logs(
            &args.transaction_pool.logs,
            &mut prepared,
            timestamp,
            self_shard,
            args.number_of_shards,
        );

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);

        if self.is_index_enabled(TRANSACTIONS_INDEX) {
            self.transactions_proc.serialize_transactions(
                &prepared.transactions,
                &prepared.tx_hash_status,
                self_shard,
                &mut buffer,
                TRANSACTIONS_INDEX,
            )?;
        }

        if self.is_index_enabled(OPERATIONS_INDEX) {
            let (op_txs, op_scrs) = self.operations_proc.process_transactions_and_scrs(
                &prepared.transactions,
                &prepared.scrs,
                args.is_import_db,
                self_shard,
            );
            self.transactions_proc.serialize_transactions(
                &op_txs,
                &prepared.tx_hash_status,
                self_shard,
                &mut buffer,
                OPERATIONS_INDEX,
            )?;
            self.operations_proc
                .serialize_scrs(&op_scrs, &mut buffer, OPERATIONS_INDEX, self_shard)?;
        }

        self.index_transactions_fee_data(&prepared.tx_hash_refund, &mut buffer)
            .await?;
        self.index_nft_create_info(&mut logs_results.tokens, &mut buffer)
            .await?;

        if self.is_index_enabled(LOGS_INDEX) {
            let logs = self
                .logs_proc
                .prepare_logs_for_db(&args.transaction_pool.logs, timestamp);
            self.logs_proc
                .serialize_logs(&logs, &mut buffer, LOGS_INDEX)?;
        }

        if self.is_index_enabled(SCRESULTS_INDEX) {
            self.transactions_proc
                .serialize_scrs(&prepared.scrs, &mut buffer, SCRESULTS_INDEX)?;
        }

        if self.is_index_enabled(RECEIPTS_INDEX) {
            self.transactions_proc
                .serialize_receipts(&prepared.receipts, &mut buffer, RECEIPTS_INDEX)?;
        }

        let mut tags = logs_results.tags;
        self.index_altered_accounts(
            timestamp,
            &logs_results.nfts_data_updates,
            &args.altered_accounts,
            &mut buffer,
            &mut tags,
            self_shard,
        )
        .await?;

        if self.is_index_enabled(TAGS_INDEX) && !tags.is_empty() {
            tags.serialize(&mut buffer, TAGS_INDEX);
        }

        if self.is_index_enabled(TOKENS_INDEX) {
            self.logs_proc.serialize_tokens(
                &logs_results.tokens_info,
                &logs_results.nfts_data_updates,
                &mut buffer,
                TOKENS_INDEX,
            )?;
            self.logs_proc.serialize_roles_data(
                &logs_results.token_roles_and_properties,
                &mut buffer,
                TOKENS_INDEX,
            );
        }

        if self.is_index_enabled(DELEGATORS_INDEX) {
            self.logs_proc.serialize_delegators(
                &logs_results.delegators,
                &mut buffer,
                DELEGATORS_INDEX,
            )?;
        }

        self.index_nft_burn_info(&mut logs_results.tokens_supply, &mut buffer)
            .await?;

        if self.is_index_enabled(SC_DEPLOYS_INDEX) {
            self.logs_proc.serialize_sc_deploys(
                &logs_results.sc_deploys,
                &mut buffer,
                SC_DEPLOYS_INDEX,
            )?;
        }

        self.do_bulk_requests("", &buffer).await
    }

    async fn save_accounts(
        &self,
        timestamp: u64,
        accounts: &[AlteredAccount],
        shard_id: u32,
    ) -> anyhow::Result<()> {
        let regular: Vec<RegularAccount> = accounts
            .iter()
            .map(|account| RegularAccount {
                account: account.clone(),
                is_sender: account.additional.is_sender,
            })
            .collect();

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.save_regular_accounts(timestamp, &regular, &mut buffer, shard_id)?;
        self.do_bulk_requests("", &buffer).await
    }

    async fn save_rounds_info(&self, rounds: &[RoundInfo]) -> anyhow::Result<()> {
        if !self.is_index_enabled(ROUNDS_INDEX) {
            return Ok(());
        }

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.statistics_proc
            .serialize_rounds_info(rounds, &mut buffer)?;
        self.do_bulk_requests(ROUNDS_INDEX, &buffer).await
    }

    async fn save_validators_rating(
        &self,
        index: &str,
        ratings: &[ValidatorRatingInfo],
    ) -> anyhow::Result<()> {
        if !self.is_index_enabled(RATING_INDEX) {
            return Ok(());
        }

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.validators_proc
            .serialize_validators_rating(index, ratings, &mut buffer)?;
        self.do_bulk_requests(RATING_INDEX, &buffer).await
    }

    async fn save_shard_validators_pub_keys(
        &self,
        shard_id: u32,
        epoch: u32,
        pub_keys: &[Vec<u8>],
    ) -> anyhow::Result<()> {
        if !self.is_index_enabled(VALIDATORS_INDEX) {
            return Ok(());
        }

        let mut buffer = BufferSlice::new(self.bulk_request_max_size);
        self.validators_proc.prepare_and_serialize_validators_pub_keys(
            shard_id,
            epoch,
            pub_keys,
            &mut buffer,
        )?;
        self.do_bulk_requests(VALIDATORS_INDEX, &buffer).await
    }

    async fn remove_header(&self, header: &Header) -> anyhow::Result<()> {
        let header_hash = self.block_proc.compute_header_hash(header)?;
        self.client
            .do_query_remove(
                BLOCKS_INDEX,
                hashes_query(&[hex::encode(header_hash)]),
            )
            .await
    }

    async fn remove_miniblocks(&self, header: &Header, body: &Body) -> anyhow::Result<()> {
        let hashes = self
            .miniblocks_proc
            .get_miniblocks_hashes_hex_encoded(header, body);
        if hashes.is_empty() {
            return Ok(());
        }
        self.client
            .do_query_remove(MINIBLOCKS_INDEX, hashes_query(&hashes))
            .await
    }

    async fn remove_transactions(&self, header: &Header, body: &Body) -> anyhow::Result<()> {
        let (tx_hashes, scr_hashes) = self
            .transactions_proc
            .get_hex_encoded_hashes_for_remove(header, body);

        self.remove_if_hashes_not_empty(TRANSACTIONS_INDEX, tx_hashes.clone())
            .await?;
        self.remove_if_hashes_not_empty(SCRESULTS_INDEX, scr_hashes.clone())
            .await?;

        let mut union = tx_hashes;
        union.extend(scr_hashes);
        self.remove_if_hashes_not_empty(OPERATIONS_INDEX, union.clone())
            .await?;
        self.remove_if_hashes_not_empty(LOGS_INDEX, union).await?;

        self.update_delegators_in_case_of_revert(header, body).await
    }

    async fn remove_accounts_esdt(&self, timestamp: u64, shard_id: u32) -> anyhow::Result<()> {
        let query = json!({
            "query": {
                "bool": {
                    "must": [
                        {"match": {"shardID": {"query": shard_id, "operator": "AND"}}},
                        {"match": {"timestamp": {"query": timestamp, "operator": "AND"}}}
                    ]
                }
            }
        });

        self.client
            .do_query_remove(ACCOUNTS_ESDT_INDEX, query.clone())
            .await?;
        self.client
            .do_query_remove(ACCOUNTS_ESDT_HISTORY_INDEX, query)
            .await
    }
}
