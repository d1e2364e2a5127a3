use std::collections::HashMap;

use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::json;

use crate::data::BufferSlice;

/// Occurrence counters for NFT tags, keyed in the index by the base64 of the
/// tag so arbitrary tag bytes stay a valid document id.
#[derive(Debug, Default)]
pub struct TagsCount {
    tags: HashMap<String, u64>,
}

impl TagsCount {
    pub fn new() -> Self {
        TagsCount::default()
    }

    pub fn parse_tags(&mut self, tags: &[String]) {
        for tag in tags {
            if tag.is_empty() {
                continue;
            }
            *self.tags.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Counter increments as scripted upserts.
    pub fn serialize(&self, buffer: &mut BufferSlice, index: &str) {
        for (tag, count) in &self.tags {
            let encoded = STANDARD.encode(tag);
            let meta = format!(
                r#"{{ "update" : {{ "_index":"{}", "_id" : "{}" }} }}"#,
                index, encoded
            );
            let payload = json!({
                "script": {
                    "source": "ctx._source.count += params.count",
                    "lang": "painless",
                    "params": {"count": count}
                },
                "upsert": {"count": count, "tag": tag}
            });
            buffer.put_data(&meta, &payload.to_string());
        }
    }
}
