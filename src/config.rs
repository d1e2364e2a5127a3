use std::{
    collections::{HashMap, HashSet},
    fs,
    path::Path,
};

use anyhow::Context;
use log::warn;
use serde::Deserialize;

use crate::constants::DEFAULT_BULK_REQUEST_MAX_SIZE;

/// Top-level configuration, loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub marshaller: MarshallerConfig,
    pub hasher: HasherConfig,
    pub address_converter: AddressConverterConfig,
    pub validator_keys_converter: ValidatorKeysConverterConfig,
    pub economics: EconomicsConfig,
    pub available_indices: Vec<String>,
    pub cluster: ClusterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarshallerConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HasherConfig {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddressConverterConfig {
    pub length: usize,
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValidatorKeysConverterConfig {
    pub length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EconomicsConfig {
    pub denomination: u32,
    #[serde(default = "default_min_gas_limit")]
    pub min_gas_limit: u64,
    #[serde(default = "default_gas_per_data_byte")]
    pub gas_per_data_byte: u64,
    #[serde(default = "default_gas_price_modifier")]
    pub gas_price_modifier: f64,
}

fn default_min_gas_limit() -> u64 {
    50_000
}

fn default_gas_per_data_byte() -> u64 {
    1_500
}

fn default_gas_price_modifier() -> f64 {
    0.01
}

/// Per-cluster settings: the search store endpoint, the indices disabled for
/// this deployment and the observer websocket to consume.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterConfig {
    pub elastic_cluster: ElasticClusterConfig,
    #[serde(default)]
    pub disabled_indices: Vec<String>,
    pub web_socket: WebSocketConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ElasticClusterConfig {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub use_kibana: bool,
    #[serde(default = "default_bulk_request_max_size")]
    pub bulk_request_max_size_in_bytes: usize,
}

fn default_bulk_request_max_size() -> usize {
    DEFAULT_BULK_REQUEST_MAX_SIZE
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSocketConfig {
    pub server_url: String,
    pub data_marshaller_type: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    /// The effective set of indices to write: available minus disabled.
    pub fn enabled_indices(&self) -> HashSet<String> {
        let disabled: HashSet<&str> = self
            .cluster
            .disabled_indices
            .iter()
            .map(String::as_str)
            .collect();

        self.available_indices
            .iter()
            .filter(|index| !disabled.contains(index.as_str()))
            .cloned()
            .collect()
    }
}

/// Reads `<index>.json` template files from the given directory. The
/// templates are opaque byte buffers handed to the write layer at init;
/// a missing directory only produces a warning.
pub fn load_templates(dir: Option<&Path>) -> HashMap<String, Vec<u8>> {
    let mut templates = HashMap::new();
    let Some(dir) = dir else {
        return templates;
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!("cannot read templates directory {}: {err}", dir.display());
            return templates;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        match fs::read(&path) {
            Ok(bytes) => {
                templates.insert(name.to_string(), bytes);
            }
            Err(err) => warn!("cannot read template {}: {err}", path.display()),
        }
    }

    templates
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        available_indices = ["transactions", "blocks", "miniblocks", "logs"]

        [marshaller]
        type = "json"

        [hasher]
        type = "blake2b"

        [address_converter]
        length = 32
        prefix = "erd"

        [validator_keys_converter]
        length = 96

        [economics]
        denomination = 18

        [cluster.elastic_cluster]
        url = "http://localhost:9200"
        username = "elastic"
        password = "changeme"

        [cluster.web_socket]
        server_url = "ws://localhost:22111"
        data_marshaller_type = "json"
    "#;

    #[test]
    fn parse_sample_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.marshaller.kind, "json");
        assert_eq!(config.hasher.kind, "blake2b");
        assert_eq!(config.address_converter.length, 32);
        assert_eq!(config.economics.denomination, 18);
        assert_eq!(config.economics.min_gas_limit, 50_000);
        assert_eq!(config.economics.gas_per_data_byte, 1_500);
        assert_eq!(
            config.cluster.elastic_cluster.bulk_request_max_size_in_bytes,
            DEFAULT_BULK_REQUEST_MAX_SIZE
        );
        assert!(config.cluster.disabled_indices.is_empty());
    }

    #[test]
    fn enabled_indices_subtracts_disabled() {
        let mut config: Config = toml::from_str(SAMPLE).unwrap();
        config.cluster.disabled_indices = vec!["logs".to_string(), "rounds".to_string()];

        let enabled = config.enabled_indices();
        assert!(enabled.contains("transactions"));
        assert!(enabled.contains("blocks"));
        assert!(!enabled.contains("logs"));
        assert!(!enabled.contains("rounds"));
        assert_eq!(enabled.len(), 3);
    }
}
