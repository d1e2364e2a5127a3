use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    chain::Event,
    constants::{
        ESDT_NFT_CREATE_ROLE_TRANSFER_IDENTIFIER, ESDT_ROLE_NFT_CREATE,
        ESDT_SET_ROLE_IDENTIFIER, ESDT_UNSET_ROLE_IDENTIFIER,
    },
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

/// Role grants/revocations and the NFT-create-role transfer, all emitted on
/// the metachain. A role transfer arrives as an event pair carrying a
/// false flag for the old holder and a true flag for the new one.
pub(crate) struct RolesProcessor {
    converter: Arc<dyn PubkeyConverter>,
}

impl RolesProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>) -> Self {
        RolesProcessor { converter }
    }
}

impl EventProcessor for RolesProcessor {
    fn process_event(
        &self,
        event: &Event,
        _context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        match identifier {
            ESDT_SET_ROLE_IDENTIFIER | ESDT_UNSET_ROLE_IDENTIFIER => {
                if event.topics.len() < 4 {
                    return EventOutcome {
                        processed: true,
                        ..Default::default()
                    };
                }

                let token = String::from_utf8_lossy(event.topic(0)).into_owned();
                let address = self.converter.encode(&event.address);
                let set = identifier == ESDT_SET_ROLE_IDENTIFIER;
                for role_topic in &event.topics[3..] {
                    let role = String::from_utf8_lossy(role_topic).into_owned();
                    results
                        .token_roles_and_properties
                        .add_role(&token, &address, &role, set);
                }

                EventOutcome {
                    processed: true,
                    ..Default::default()
                }
            }
            ESDT_NFT_CREATE_ROLE_TRANSFER_IDENTIFIER => {
                if event.topics.len() < 4 {
                    return EventOutcome {
                        processed: true,
                        ..Default::default()
                    };
                }

                let token = String::from_utf8_lossy(event.topic(0)).into_owned();
                let address = self.converter.encode(&event.address);
                let set = event.topic(3).iter().any(|b| *b != 0);
                results.token_roles_and_properties.add_role(
                    &token,
                    &address,
                    ESDT_ROLE_NFT_CREATE,
                    set,
                );

                EventOutcome {
                    processed: true,
                    ..Default::default()
                }
            }
            _ => EventOutcome::default(),
        }
    }
}
