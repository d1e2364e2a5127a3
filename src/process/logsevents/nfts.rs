use std::sync::Arc;

use log::warn;

use crate::{
    address::PubkeyConverter,
    chain::{ChainTokenMetaData, Event},
    constants::{
        ESDT_NFT_BURN, ESDT_NFT_CREATE, ESDT_NFT_TRANSFER, ESDT_WIPE, MULTI_ESDT_NFT_TRANSFER,
    },
    converters::{
        bytes_to_decimal_string, bytes_to_u64, compute_token_identifier,
        token_metadata::prepare_token_metadata,
    },
    data::TokenInfo,
    marshal::Marshalizer,
    sharding::compute_shard_id,
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

const NUM_TOPICS_WITH_RECEIVER: usize = 4;

/// Quantified tokens: creation (with marshalled metadata in the fourth
/// topic), burns and wipes, and the receiver side of transfers.
pub(crate) struct NftsProcessor {
    converter: Arc<dyn PubkeyConverter>,
    marshalizer: Arc<dyn Marshalizer>,
}

impl NftsProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>, marshalizer: Arc<dyn Marshalizer>) -> Self {
        NftsProcessor {
            converter,
            marshalizer,
        }
    }

    fn process_event_on_sender(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) {
        let token = String::from_utf8_lossy(event.topic(0)).into_owned();
        let nonce = bytes_to_u64(event.topic(1));
        let identifier = event.identifier_str();

        if matches!(identifier, ESDT_NFT_BURN | ESDT_WIPE) {
            results.tokens_supply.add(TokenInfo {
                token: token.clone(),
                identifier: compute_token_identifier(&token, nonce),
                nonce,
                timestamp: context.timestamp,
                ..Default::default()
            });
            return;
        }

        let is_create = identifier == ESDT_NFT_CREATE;
        if !is_create || event.topics.len() < NUM_TOPICS_WITH_RECEIVER {
            return;
        }

        let metadata = match self
            .marshalizer
            .unmarshal::<ChainTokenMetaData>(event.topic(3))
        {
            Ok(metadata) => metadata,
            Err(err) => {
                warn!("cannot unmarshal token metadata on NFT create: {err}");
                return;
            }
        };

        results.tokens.add(TokenInfo {
            token: token.clone(),
            identifier: compute_token_identifier(&token, nonce),
            nonce,
            timestamp: context.timestamp,
            data: Some(prepare_token_metadata(&*self.converter, &metadata)),
            ..Default::default()
        });
    }

    fn should_add_receiver_data(&self, event: &Event) -> bool {
        let identifier = event.identifier_str();
        let can_carry_receiver = matches!(
            identifier,
            ESDT_NFT_TRANSFER | MULTI_ESDT_NFT_TRANSFER | ESDT_WIPE
        );
        can_carry_receiver && event.topics.len() >= NUM_TOPICS_WITH_RECEIVER
    }
}

impl EventProcessor for NftsProcessor {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        let known = matches!(
            identifier,
            ESDT_NFT_CREATE | ESDT_NFT_BURN | ESDT_WIPE | ESDT_NFT_TRANSFER
                | MULTI_ESDT_NFT_TRANSFER
        );
        if !known || event.topics.len() < 3 {
            return EventOutcome::default();
        }

        let nonce = bytes_to_u64(event.topic(1));
        if nonce == 0 {
            // fungible token, handled by the previous chain link
            return EventOutcome::default();
        }

        let sender_shard = compute_shard_id(&event.address, context.number_of_shards);
        if sender_shard == context.self_shard_id {
            self.process_event_on_sender(event, context, results);
        }

        let token = String::from_utf8_lossy(event.topic(0)).into_owned();
        let token_identifier = compute_token_identifier(&token, nonce);

        if !self.should_add_receiver_data(event) {
            return EventOutcome {
                processed: true,
                identifier: Some(token_identifier),
                value: Some(bytes_to_decimal_string(event.topic(2))),
                ..Default::default()
            };
        }

        let receiver = event.topic(3);
        let receiver_shard = compute_shard_id(receiver, context.number_of_shards);
        if receiver_shard != context.self_shard_id {
            return EventOutcome {
                processed: true,
                identifier: Some(token_identifier),
                value: Some(bytes_to_decimal_string(event.topic(2))),
                ..Default::default()
            };
        }

        if identifier == ESDT_WIPE {
            results.tokens_supply.add(TokenInfo {
                token: token.clone(),
                identifier: token_identifier.clone(),
                nonce,
                timestamp: context.timestamp,
                ..Default::default()
            });
        }

        EventOutcome {
            processed: true,
            identifier: Some(token_identifier),
            value: Some(bytes_to_decimal_string(event.topic(2))),
            receiver: Some(self.converter.encode(receiver)),
            receiver_shard_id: Some(receiver_shard),
        }
    }
}
