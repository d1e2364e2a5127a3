use crate::data::{BufferSlice, RoundInfo};

/// Per-round statistics, one document per `<shard>_<round>`.
pub struct StatisticsProcessor;

impl StatisticsProcessor {
    pub fn new() -> Self {
        StatisticsProcessor
    }

    pub fn serialize_rounds_info(
        &self,
        rounds: &[RoundInfo],
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        for round in rounds {
            let meta = format!(
                r#"{{ "index" : {{ "_id" : "{}_{}" }} }}"#,
                round.shard_id, round.round
            );
            buffer.put_data(&meta, &serde_json::to_string(round)?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_are_keyed_by_shard_and_round() {
        let rounds = vec![RoundInfo {
            round: 57,
            shard_id: 1,
            block_was_proposed: true,
            signers_indexes: vec![0, 3],
            epoch: 2,
            timestamp: 5040,
            ..Default::default()
        }];

        let mut buffer = BufferSlice::new(1 << 20);
        StatisticsProcessor::new()
            .serialize_rounds_info(&rounds, &mut buffer)
            .unwrap();

        let content = &buffer.buffers()[0];
        assert!(content.contains(r#""_id" : "1_57""#));
        assert!(content.contains(r#""blockWasProposed":true"#));
    }
}
