use crate::{
    chain::{AlteredAccount, Body, Header, SaveBlockData},
    data::{RoundInfo, ValidatorRatingInfo},
    process::elastic::ElasticProcessorHandler,
};

/// One unit of work for the dispatcher: a coarse operation on the elastic
/// processor with its captured inputs.
pub enum WorkItem {
    Block {
        args: Box<SaveBlockData>,
        txs_size: usize,
    },
    RemoveBlock {
        header: Header,
        body: Body,
    },
    Rounds(Vec<RoundInfo>),
    Accounts {
        timestamp: u64,
        accounts: Vec<AlteredAccount>,
        shard_id: u32,
    },
    Rating {
        index: String,
        ratings: Vec<ValidatorRatingInfo>,
    },
    ValidatorsPubKeys {
        shard_id: u32,
        epoch: u32,
        pub_keys: Vec<Vec<u8>>,
    },
}

impl WorkItem {
    pub async fn save(&self, processor: &dyn ElasticProcessorHandler) -> anyhow::Result<()> {
        match self {
            WorkItem::Block { args, txs_size } => {
                processor.save_header(args, *txs_size).await?;
                processor.save_miniblocks(&args.header, &args.body).await?;
                processor.save_transactions(args).await
            }
            WorkItem::RemoveBlock { header, body } => {
                processor.remove_header(header).await?;
                processor.remove_miniblocks(header, body).await?;
                processor.remove_transactions(header, body).await?;
                processor
                    .remove_accounts_esdt(header.timestamp(), header.shard_id())
                    .await
            }
            WorkItem::Rounds(rounds) => processor.save_rounds_info(rounds).await,
            WorkItem::Accounts {
                timestamp,
                accounts,
                shard_id,
            } => {
                processor
                    .save_accounts(*timestamp, accounts, *shard_id)
                    .await
            }
            WorkItem::Rating { index, ratings } => {
                processor.save_validators_rating(index, ratings).await
            }
            WorkItem::ValidatorsPubKeys {
                shard_id,
                epoch,
                pub_keys,
            } => {
                processor
                    .save_shard_validators_pub_keys(*shard_id, *epoch, pub_keys)
                    .await
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            WorkItem::Block { .. } => "block",
            WorkItem::RemoveBlock { .. } => "remove-block",
            WorkItem::Rounds(_) => "rounds",
            WorkItem::Accounts { .. } => "accounts",
            WorkItem::Rating { .. } => "rating",
            WorkItem::ValidatorsPubKeys { .. } => "validators-pubkeys",
        }
    }
}
