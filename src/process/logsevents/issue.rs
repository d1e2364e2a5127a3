use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    chain::Event,
    constants::{
        FUNGIBLE_ESDT, ISSUE_FUNGIBLE_IDENTIFIER, ISSUE_NON_FUNGIBLE_IDENTIFIER,
        ISSUE_SEMI_FUNGIBLE_IDENTIFIER, META_ESDT, NON_FUNGIBLE_ESDT,
        REGISTER_META_ESDT_IDENTIFIER, SEMI_FUNGIBLE_ESDT, TRANSFER_OWNERSHIP_IDENTIFIER,
    },
    data::TokenInfo,
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

/// Token issuance and ownership transfer, emitted by the system contract on
/// the metachain only.
pub(crate) struct EsdtIssueProcessor {
    converter: Arc<dyn PubkeyConverter>,
}

impl EsdtIssueProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>) -> Self {
        EsdtIssueProcessor { converter }
    }
}

impl EventProcessor for EsdtIssueProcessor {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        let token_type = match identifier {
            ISSUE_FUNGIBLE_IDENTIFIER => FUNGIBLE_ESDT,
            ISSUE_SEMI_FUNGIBLE_IDENTIFIER => SEMI_FUNGIBLE_ESDT,
            ISSUE_NON_FUNGIBLE_IDENTIFIER => NON_FUNGIBLE_ESDT,
            REGISTER_META_ESDT_IDENTIFIER => META_ESDT,
            TRANSFER_OWNERSHIP_IDENTIFIER => "",
            _ => return EventOutcome::default(),
        };

        if event.topics.len() < 3 {
            return EventOutcome {
                processed: true,
                ..Default::default()
            };
        }

        let issuer = self.converter.encode(&event.address);
        let mut token = TokenInfo {
            token: String::from_utf8_lossy(event.topic(0)).into_owned(),
            name: String::from_utf8_lossy(event.topic(1)).into_owned(),
            ticker: String::from_utf8_lossy(event.topic(2)).into_owned(),
            issuer: issuer.clone(),
            current_owner: issuer,
            token_type: token_type.to_string(),
            timestamp: context.timestamp,
            ..Default::default()
        };

        if identifier == TRANSFER_OWNERSHIP_IDENTIFIER {
            if event.topics.len() < 4 {
                return EventOutcome {
                    processed: true,
                    ..Default::default()
                };
            }
            token.current_owner = self
                .converter
                .encode(event.topic(event.topics.len() - 1));
            token.transfer_ownership = true;
        }

        results.tokens_info.push(token);
        EventOutcome {
            processed: true,
            ..Default::default()
        }
    }
}
