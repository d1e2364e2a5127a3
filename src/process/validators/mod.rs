use std::sync::Arc;

use crate::{
    address::PubkeyConverter,
    data::{BufferSlice, ValidatorRatingInfo, ValidatorsPublicKeys},
};

pub struct ValidatorsProcessor {
    validator_converter: Arc<dyn PubkeyConverter>,
}

impl ValidatorsProcessor {
    pub fn new(validator_converter: Arc<dyn PubkeyConverter>) -> Self {
        ValidatorsProcessor {
            validator_converter,
        }
    }

    /// One document per `<shard>_<epoch>` with the encoded validator set.
    pub fn prepare_and_serialize_validators_pub_keys(
        &self,
        shard_id: u32,
        epoch: u32,
        pub_keys: &[Vec<u8>],
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        let doc = ValidatorsPublicKeys {
            public_keys: pub_keys
                .iter()
                .map(|key| self.validator_converter.encode(key))
                .collect(),
        };

        let meta = format!(r#"{{ "index" : {{ "_id" : "{}_{}" }} }}"#, shard_id, epoch);
        buffer.put_data(&meta, &serde_json::to_string(&doc)?);
        Ok(())
    }

    /// Rating snapshots keyed `<pubkey>_<index>`.
    pub fn serialize_validators_rating(
        &self,
        index: &str,
        ratings: &[ValidatorRatingInfo],
        buffer: &mut BufferSlice,
    ) -> anyhow::Result<()> {
        for rating in ratings {
            let meta = format!(
                r#"{{ "index" : {{ "_id" : "{}_{}" }} }}"#,
                rating.public_key, index
            );
            buffer.put_data(&meta, &serde_json::to_string(rating)?);
        }
        Ok(())
    }
}
