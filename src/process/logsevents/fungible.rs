use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    chain::Event,
    constants::{ESDT_LOCAL_BURN, ESDT_LOCAL_MINT, ESDT_TRANSFER, ESDT_WIPE},
    converters::bytes_to_decimal_string,
    data::TokenInfo,
    sharding::compute_shard_id,
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

const NUM_TOPICS_WITH_RECEIVER: usize = 4;

/// Fungible ESDT movements: transfers, local mints and burns, wipes.
pub(crate) struct FungibleEsdtProcessor {
    converter: Arc<dyn PubkeyConverter>,
}

impl FungibleEsdtProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>) -> Self {
        FungibleEsdtProcessor { converter }
    }
}

impl EventProcessor for FungibleEsdtProcessor {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        let known = matches!(
            identifier,
            ESDT_TRANSFER | ESDT_LOCAL_MINT | ESDT_LOCAL_BURN | ESDT_WIPE
        );
        if !known || event.topics.len() < 3 {
            return EventOutcome::default();
        }

        // a non-zero nonce means a quantified token, handled downstream
        if !event.topic(1).iter().all(|b| *b == 0) {
            return EventOutcome::default();
        }

        let token = String::from_utf8_lossy(event.topic(0)).into_owned();
        let value = bytes_to_decimal_string(event.topic(2));

        if matches!(identifier, ESDT_LOCAL_BURN | ESDT_WIPE) {
            results.tokens_supply.add(TokenInfo {
                token: token.clone(),
                identifier: token.clone(),
                timestamp: context.timestamp,
                ..Default::default()
            });
        }

        let mut outcome = EventOutcome {
            processed: true,
            identifier: Some(token),
            value: Some(value),
            ..Default::default()
        };

        let has_receiver = identifier == ESDT_TRANSFER
            && event.topics.len() >= NUM_TOPICS_WITH_RECEIVER;
        if has_receiver {
            let receiver = event.topic(3);
            outcome.receiver = Some(self.converter.encode(receiver));
            outcome.receiver_shard_id =
                Some(compute_shard_id(receiver, context.number_of_shards));
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::HexPubkeyConverter;

    fn context<'a>() -> EventContext<'a> {
        EventContext {
            tx_hash_hex: "aabb",
            log_address: &[],
            timestamp: 5040,
            self_shard_id: 0,
            number_of_shards: 2,
        }
    }

    fn processor() -> FungibleEsdtProcessor {
        FungibleEsdtProcessor::new(Arc::new(HexPubkeyConverter::new(3, "")))
    }

    #[test]
    fn local_burn_registers_supply_change() {
        let event = Event {
            identifier: b"ESDTLocalBurn".to_vec(),
            topics: vec![b"TOK-abcd".to_vec(), vec![], vec![0x64]],
            ..Default::default()
        };

        let mut results = PreparedLogsResults::default();
        let outcome = processor().process_event(&event, &context(), &mut results);

        assert!(outcome.processed);
        assert_eq!(outcome.identifier.as_deref(), Some("TOK-abcd"));
        assert_eq!(outcome.value.as_deref(), Some("100"));
        assert_eq!(results.tokens_supply.len(), 1);
    }

    #[test]
    fn nft_nonce_is_left_to_the_nft_processor() {
        let event = Event {
            identifier: b"ESDTTransfer".to_vec(),
            topics: vec![b"TOK-abcd".to_vec(), vec![0x01], vec![0x64]],
            ..Default::default()
        };

        let mut results = PreparedLogsResults::default();
        let outcome = processor().process_event(&event, &context(), &mut results);
        assert!(!outcome.processed);
    }

    #[test]
    fn unknown_identifier_is_ignored() {
        let event = Event {
            identifier: b"somethingElse".to_vec(),
            topics: vec![vec![], vec![], vec![]],
            ..Default::default()
        };
        let mut results = PreparedLogsResults::default();
        assert!(!processor().process_event(&event, &context(), &mut results).processed);
    }
}
