use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    chain::Event,
    constants::{SC_DEPLOY_IDENTIFIER, SC_UPGRADE_IDENTIFIER},
    data::{ScDeployInfo, ScDeployUpgrade},
};

use super::{EventContext, EventOutcome, EventProcessor, PreparedLogsResults};

/// Contract deployments and upgrades, keyed by the contract address.
pub(crate) struct ScDeploysProcessor {
    converter: Arc<dyn PubkeyConverter>,
}

impl ScDeploysProcessor {
    pub fn new(converter: Arc<dyn PubkeyConverter>) -> Self {
        ScDeploysProcessor { converter }
    }
}

impl EventProcessor for ScDeploysProcessor {
    fn process_event(
        &self,
        event: &Event,
        context: &EventContext,
        results: &mut PreparedLogsResults,
    ) -> EventOutcome {
        let identifier = event.identifier_str();
        if !matches!(identifier, SC_DEPLOY_IDENTIFIER | SC_UPGRADE_IDENTIFIER) {
            return EventOutcome::default();
        }
        if event.topics.len() < 2 {
            return EventOutcome {
                processed: true,
                ..Default::default()
            };
        }

        let sc_address = self.converter.encode(event.topic(0));
        let creator = self.converter.encode(event.topic(1));

        if identifier == SC_UPGRADE_IDENTIFIER {
            let entry = results.sc_deploys.entry(sc_address).or_default();
            entry.upgrades.push(ScDeployUpgrade {
                tx_hash: context.tx_hash_hex.to_string(),
                upgrader: creator,
                timestamp: context.timestamp,
            });
        } else {
            results.sc_deploys.insert(
                sc_address,
                ScDeployInfo {
                    tx_hash: context.tx_hash_hex.to_string(),
                    deployer: creator,
                    timestamp: context.timestamp,
                    upgrades: Vec::new(),
                },
            );
        }

        EventOutcome {
            processed: true,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::HexPubkeyConverter;

    fn context() -> EventContext<'static> {
        EventContext {
            tx_hash_hex: "deadbeef",
            log_address: &[],
            timestamp: 5040,
            self_shard_id: 0,
            number_of_shards: 2,
        }
    }

    #[test]
    fn deploy_then_upgrade_accumulates() {
        let processor = ScDeploysProcessor::new(Arc::new(HexPubkeyConverter::new(3, "")));
        let mut results = PreparedLogsResults::default();

        let deploy = Event {
            identifier: b"SCDeploy".to_vec(),
            topics: vec![vec![0, 0, 5], vec![1, 1, 1]],
            ..Default::default()
        };
        let upgrade = Event {
            identifier: b"SCUpgrade".to_vec(),
            topics: vec![vec![0, 0, 5], vec![2, 2, 2]],
            ..Default::default()
        };

        assert!(processor.process_event(&deploy, &context(), &mut results).processed);
        assert!(processor.process_event(&upgrade, &context(), &mut results).processed);

        let info = &results.sc_deploys["000005"];
        assert_eq!(info.deployer, "010101");
        assert_eq!(info.upgrades.len(), 1);
        assert_eq!(info.upgrades[0].upgrader, "020202");
    }
}
