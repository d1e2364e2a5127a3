use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    chain::Event,
    constants::{
        DELEGATE_IDENTIFIER, REDELEGATE_REWARDS_IDENTIFIER, UNDELEGATE_IDENTIFIER,
        WITHDRAW_IDENTIFIER,
    },
    converters::{bytes_to_decimal_string, BalanceConverter},
    data::Delegator,
    hashing::Hasher,
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

/// Delegation moves on the metachain staking contracts. The active stake
/// after the operation rides in the second topic; a withdraw that zeroes it
/// removes the row.
pub(crate) struct DelegatorsProcessor {
    converter: Arc<dyn PubkeyConverter>,
    balance_converter: Arc<BalanceConverter>,
    hasher: Arc<dyn Hasher>,
}

impl DelegatorsProcessor {
    pub fn new(
        converter: Arc<dyn PubkeyConverter>,
        balance_converter: Arc<BalanceConverter>,
        hasher: Arc<dyn Hasher>,
    ) -> Self {
        DelegatorsProcessor {
            converter,
            balance_converter,
            hasher,
        }
    }
}

impl EventProcessor for DelegatorsProcessor {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        let known = matches!(
            identifier,
            DELEGATE_IDENTIFIER
                | UNDELEGATE_IDENTIFIER
                | WITHDRAW_IDENTIFIER
                | REDELEGATE_REWARDS_IDENTIFIER
        );
        if !known {
            return EventOutcome::default();
        }
        if event.topics.len() < 2 {
            return EventOutcome {
                processed: true,
                ..Default::default()
            };
        }

        let active_stake = bytes_to_decimal_string(event.topic(1));
        let should_delete = identifier == WITHDRAW_IDENTIFIER && active_stake == "0";

        let mut key_bytes = event.address.clone();
        key_bytes.extend_from_slice(context.log_address);
        let key = hex::encode(self.hasher.compute(&key_bytes));

        results.delegators.insert(
            key,
            Delegator {
                address: self.converter.encode(&event.address),
                contract: self.converter.encode(context.log_address),
                active_stake_num: self
                    .balance_converter
                    .compute_balance_as_float(&active_stake),
                active_stake,
                timestamp: context.timestamp,
                should_delete,
            },
        );

        EventOutcome {
            processed: true,
            ..Default::default()
        }
    }
}
