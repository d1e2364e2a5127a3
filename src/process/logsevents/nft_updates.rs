use crate::{
    chain::Event,
    constants::{ESDT_NFT_ADD_URI, ESDT_NFT_UPDATE_ATTRIBUTES},
    converters::{bytes_to_u64, compute_token_identifier},
    data::NftDataUpdate,
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

/// NFT metadata changes after creation: appended URIs and replaced
/// attributes. Every event stays its own update so the scripted writes
/// apply in event order.
pub(crate) struct NftUpdatesProcessor;

impl NftUpdatesProcessor {
    pub fn new() -> Self {
        NftUpdatesProcessor
    }
}

impl EventProcessor for NftUpdatesProcessor {
    fn process_event(
        &self,
        event: &Event,
        _context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        let known = matches!(identifier, ESDT_NFT_ADD_URI | ESDT_NFT_UPDATE_ATTRIBUTES);
        if !known {
            return EventOutcome::default();
        }
        if event.topics.len() < 3 {
            return EventOutcome {
                processed: true,
                ..Default::default()
            };
        }

        let token = String::from_utf8_lossy(event.topic(0)).into_owned();
        let nonce = bytes_to_u64(event.topic(1));
        let token_identifier = compute_token_identifier(&token, nonce);

        let mut update = NftDataUpdate {
            identifier: token_identifier,
            ..Default::default()
        };
        match identifier {
            ESDT_NFT_ADD_URI => update.uris_to_add = event.topics[2..].to_vec(),
            _ => update.new_attributes = event.topic(2).to_vec(),
        }

        results.nfts_data_updates.push(update);
        EventOutcome {
            processed: true,
            ..Default::default()
        }
    }
}
