use serde::{Deserialize, Serialize};

/// The log attached to a transaction or smart-contract result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TxLog {
    pub address: Vec<u8>,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Event {
    pub address: Vec<u8>,
    pub identifier: Vec<u8>,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
    pub additional_data: Vec<Vec<u8>>,
}

impl Event {
    pub fn identifier_str(&self) -> &str {
        std::str::from_utf8(&self.identifier).unwrap_or("")
    }

    pub fn topic(&self, index: usize) -> &[u8] {
        self.topics.get(index).map(Vec::as_slice).unwrap_or(&[])
    }
}
