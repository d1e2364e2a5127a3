//! Wires the whole pipeline out of the configuration: collaborators,
//! DB client, sub-processors, elastic processor, dispatcher, indexer and
//! finally the websocket client.

use std::{collections::HashMap, sync::Arc};

use crate::{
    address::{new_address_converter, new_validator_keys_converter},
    client::ElasticClient,
    config::Config,
    converters::BalanceConverter,
    dispatcher::DataDispatcher,
    fees::FeesProcessor,
    hashing::new_hasher,
    indexer::DataIndexer,
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
    ws::WsClient,
};

const INDEXER_CACHE_SIZE: usize = 1;

/// Builds the full websocket indexer. The returned [DataIndexer] handle is
/// what the caller uses to close the pipeline.
pub async fn create_ws_indexer(
    config: &Config,
    index_templates: HashMap<String, Vec<u8>>,
) -> anyhow::Result<(WsClient, Arc<DataIndexer>)> {
    let indexer = create_data_indexer(config, index_templates).await?;

    let ws_marshalizer = new_marshalizer(&config.cluster.web_socket.data_marshaller_type)?;
    let ws_client = WsClient::new(
        config.cluster.web_socket.server_url.clone(),
        ws_marshalizer,
        indexer.clone(),
    );

    Ok((ws_client, indexer))
}

async fn create_data_indexer(
    config: &Config,
    index_templates: HashMap<String, Vec<u8>>,
) -> anyhow::Result<Arc<DataIndexer>> {
    let marshalizer = new_marshalizer(&config.marshaller.kind)?;
    let hasher = new_hasher(&config.hasher.kind)?;
    let address_converter = new_address_converter(
        config.address_converter.length,
        &config.address_converter.prefix,
    );
    let validator_converter =
        new_validator_keys_converter(config.validator_keys_converter.length);
    let balance_converter = Arc::new(BalanceConverter::new(config.economics.denomination));
    let fees = Arc::new(FeesProcessor::new(&config.economics));

    let elastic_cluster = &config.cluster.elastic_cluster;
    let client = Arc::new(ElasticClient::new(
        &elastic_cluster.url,
        &elastic_cluster.username,
        &elastic_cluster.password,
    )?);

    let processor = ElasticProcessor::new(ElasticProcessorArgs {
        bulk_request_max_size: elastic_cluster.bulk_request_max_size_in_bytes,
        use_kibana: elastic_cluster.use_kibana,
        index_templates,
        index_policies: HashMap::new(),
        enabled_indexes: config.enabled_indices(),
        client,
        block_proc: BlockProcessor::new(hasher.clone(), marshalizer.clone()),
        miniblocks_proc: MiniblocksProcessor::new(hasher.clone(), marshalizer.clone()),
        transactions_proc: TransactionsProcessor::new(
            address_converter.clone(),
            hasher.clone(),
            marshalizer.clone(),
            fees.clone(),
        ),
        accounts_proc: AccountsProcessor::new(
            address_converter.clone(),
            balance_converter.clone(),
        ),
        logs_proc: LogsAndEventsProcessor::new(
            address_converter,
            marshalizer.clone(),
            hasher,
            fees.clone(),
            balance_converter,
        ),
        operations_proc: OperationsProcessor::new(),
        statistics_proc: StatisticsProcessor::new(),
        validators_proc: ValidatorsProcessor::new(validator_converter),
        fees,
    })
    .await?;

    let dispatcher = Arc::new(DataDispatcher::new(INDEXER_CACHE_SIZE, Arc::new(processor))?);
    dispatcher.start_index_data().await;

    Ok(Arc::new(DataIndexer::new(dispatcher, marshalizer)))
}
