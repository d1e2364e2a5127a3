//! Adapter for the observer's websocket stream: framed binary messages are
//! decoded and dispatched by operation tag to the top-level indexer.

use std::{collections::HashMap, sync::Arc};

use async_tungstenite::{tokio::connect_async, tungstenite::Message};
use futures::StreamExt;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::{
    chain::{AlteredAccount, Body, Header, SaveBlockData},
    constants::WS_RECONNECT_DELAY,
    data::{RoundInfo, ValidatorRatingInfo},
    errors::IndexerError,
    indexer::DataIndexer,
    marshal::Marshalizer,
};

/// One byte on the wire selects the operation the payload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationTag {
    SaveBlock,
    RevertIndexedBlock,
    SaveRoundsInfo,
    SaveValidatorsRating,
    SaveValidatorsPubKeys,
    SaveAccounts,
    FinalizedBlock,
}

impl OperationTag {
    pub fn from_u8(tag: u8) -> Option<OperationTag> {
        match tag {
            0 => Some(OperationTag::SaveBlock),
            1 => Some(OperationTag::RevertIndexedBlock),
            2 => Some(OperationTag::SaveRoundsInfo),
            3 => Some(OperationTag::SaveValidatorsRating),
            4 => Some(OperationTag::SaveValidatorsPubKeys),
            5 => Some(OperationTag::SaveAccounts),
            6 => Some(OperationTag::FinalizedBlock),
            _ => None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevertBlockPayload {
    pub header: Header,
    pub body: Body,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundsPayload {
    pub rounds: Vec<RoundInfo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingPayload {
    pub index: String,
    pub ratings: Vec<ValidatorRatingInfo>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorsPubKeysPayload {
    pub epoch: u32,
    pub validators_pub_keys: HashMap<u32, Vec<Vec<u8>>>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsPayload {
    pub block_timestamp: u64,
    pub accounts: Vec<AlteredAccount>,
    pub shard_id: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalizedBlockPayload {
    pub header_hash: Vec<u8>,
}

/// Splits a frame into its operation tag and payload. Layout: a four-byte
/// big-endian length covering the rest, one tag byte, then the marshalled
/// payload.
pub fn parse_frame(frame: &[u8]) -> anyhow::Result<(u8, &[u8])> {
    if frame.len() < 5 {
        return Err(IndexerError::MalformedFrame(format!(
            "frame too short: {} bytes",
            frame.len()
        ))
        .into());
    }

    let declared = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    let rest = &frame[4..];
    if declared != rest.len() {
        return Err(IndexerError::MalformedFrame(format!(
            "declared length {declared} does not match payload length {}",
            rest.len()
        ))
        .into());
    }

    Ok((rest[0], &rest[1..]))
}

pub struct WsClient {
    url: String,
    marshalizer: Arc<dyn Marshalizer>,
    indexer: Arc<DataIndexer>,
}

impl WsClient {
    pub fn new(url: String, marshalizer: Arc<dyn Marshalizer>, indexer: Arc<DataIndexer>) -> Self {
        WsClient {
            url,
            marshalizer,
            indexer,
        }
    }

    /// Consumes the observer stream until the task is aborted, reconnecting
    /// with a fixed delay after stream errors.
    pub async fn run(&self) {
        loop {
            if let Err(err) = self.consume_stream().await {
                warn!("websocket stream error: {err:#}");
            }
            info!("reconnecting to {} in {:?}", self.url, WS_RECONNECT_DELAY);
            sleep(WS_RECONNECT_DELAY).await;
        }
    }

    async fn consume_stream(&self) -> anyhow::Result<()> {
        let (mut stream, _) = connect_async(self.url.as_str()).await?;
        info!("connected to observer stream at {}", self.url);

        while let Some(message) = stream.next().await {
            match message? {
                Message::Binary(frame) => self.handle_frame(&frame).await,
                Message::Close(_) => break,
                _ => continue,
            }
        }

        Ok(())
    }

    async fn handle_frame(&self, frame: &[u8]) {
        let (tag, payload) = match parse_frame(frame) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("dropping malformed frame: {err:#}");
                return;
            }
        };

        let Some(operation) = OperationTag::from_u8(tag) else {
            warn!("dropping frame with unknown operation tag {tag}");
            return;
        };

        if let Err(err) = self.dispatch(operation, payload).await {
            warn!("cannot decode {operation:?} payload, dropping frame: {err:#}");
        }
    }

    async fn dispatch(&self, operation: OperationTag, payload: &[u8]) -> anyhow::Result<()> {
        match operation {
            OperationTag::SaveBlock => {
                let args: SaveBlockData = self.marshalizer.unmarshal(payload)?;
                self.indexer.save_block(args).await;
            }
            OperationTag::RevertIndexedBlock => {
                let args: RevertBlockPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer
                    .revert_indexed_block(args.header, args.body)
                    .await;
            }
            OperationTag::SaveRoundsInfo => {
                let args: RoundsPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer.save_rounds_info(args.rounds).await;
            }
            OperationTag::SaveValidatorsRating => {
                let args: RatingPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer
                    .save_validators_rating(args.index, args.ratings)
                    .await;
            }
            OperationTag::SaveValidatorsPubKeys => {
                let args: ValidatorsPubKeysPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer
                    .save_validators_pub_keys(args.validators_pub_keys, args.epoch)
                    .await;
            }
            OperationTag::SaveAccounts => {
                let args: AccountsPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer
                    .save_accounts(args.block_timestamp, args.accounts, args.shard_id)
                    .await;
            }
            OperationTag::FinalizedBlock => {
                let args: FinalizedBlockPayload = self.marshalizer.unmarshal(payload)?;
                self.indexer.finalized_block(&args.header_hash);
            }
        }
        Ok(())
    }
}

/// Builds a frame in the wire layout; the counterpart of [parse_frame],
/// used by tests and tooling.
pub fn build_frame(tag: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(5 + payload.len());
    frame.extend_from_slice(&((payload.len() + 1) as u32).to_be_bytes());
    frame.push(tag);
    frame.extend_from_slice(payload);
    frame
}
