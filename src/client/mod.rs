//! Thin wrapper over the search store's REST API.

pub mod response;

use anyhow::Context;
use async_trait::async_trait;
use log::{debug, trace, warn};
use reqwest::{Response, StatusCode};
use serde_json::{json, Value};

use crate::{
    constants::INDEX_SUFFIX,
    errors::IndexerError,
    client::response::BulkRequestResponse,
};

/// The operations the processors need from the search store. Implemented by
/// [ElasticClient]; tests substitute a capturing stub.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Submits one NDJSON bulk buffer. An empty `index` targets `/_bulk`
    /// with per-line `_index` routing.
    async fn do_bulk_request(&self, index: &str, buffer: &str) -> anyhow::Result<()>;

    async fn do_multi_get(
        &self,
        ids: &[String],
        index: &str,
        with_source: bool,
    ) -> anyhow::Result<Value>;

    async fn do_query_remove(&self, index: &str, query: Value) -> anyhow::Result<()>;

    async fn do_update_by_query(&self, index: &str, body: Value) -> anyhow::Result<()>;

    async fn check_and_create_template(&self, name: &str, template: &[u8]) -> anyhow::Result<()>;

    async fn check_and_create_policy(&self, name: &str, policy: &[u8]) -> anyhow::Result<()>;

    async fn check_and_create_index(&self, index: &str) -> anyhow::Result<()>;

    async fn check_and_create_alias(&self, alias: &str, index: &str) -> anyhow::Result<()>;
}

pub struct ElasticClient {
    http: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ElasticClient {
    pub fn new(url: &str, username: &str, password: &str) -> anyhow::Result<Self> {
        if url.is_empty() {
            return Err(IndexerError::NoElasticUrl.into());
        }

        Ok(ElasticClient {
            http: reqwest::Client::new(),
            base_url: url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            password: password.to_string(),
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        if self.username.is_empty() {
            builder
        } else {
            builder.basic_auth(&self.username, Some(&self.password))
        }
    }

    async fn check_status(&self, response: Response) -> anyhow::Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(IndexerError::BackOff {
                status: status.as_u16(),
            }
            .into());
        }

        Err(IndexerError::UnexpectedResponse {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn exists(&self, path: &str) -> anyhow::Result<bool> {
        let response = self
            .request(reqwest::Method::HEAD, path)
            .send()
            .await
            .with_context(|| format!("HEAD {path}"))?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl DatabaseClient for ElasticClient {
    async fn do_bulk_request(&self, index: &str, buffer: &str) -> anyhow::Result<()> {
        let path = if index.is_empty() {
            "/_bulk".to_string()
        } else {
            format!("/{index}/_bulk")
        };
        trace!("bulk request to {path}, {} bytes", buffer.len());

        let response = self
            .request(reqwest::Method::POST, &path)
            .header("Content-Type", "application/x-ndjson")
            .body(buffer.to_string())
            .send()
            .await
            .with_context(|| format!("bulk request to {path}"))?;
        let response = self.check_status(response).await?;

        let parsed: BulkRequestResponse = response.json().await.context("bulk response body")?;
        if !parsed.errors {
            return Ok(());
        }

        let reasons = parsed.extract_error_reasons();
        warn!("bulk request to {path} finished with item errors: {reasons:?}");
        Err(IndexerError::BulkItemErrors {
            reasons: reasons.join("; "),
        }
        .into())
    }

    async fn do_multi_get(
        &self,
        ids: &[String],
        index: &str,
        with_source: bool,
    ) -> anyhow::Result<Value> {
        let docs: Vec<Value> = ids
            .iter()
            .map(|id| json!({"_id": id, "_source": with_source}))
            .collect();

        let response = self
            .request(reqwest::Method::POST, &format!("/{index}/_mget"))
            .json(&json!({ "docs": docs }))
            .send()
            .await
            .with_context(|| format!("multi-get on {index}"))?;
        let response = self.check_status(response).await?;
        Ok(response.json().await?)
    }

    async fn do_query_remove(&self, index: &str, query: Value) -> anyhow::Result<()> {
        let response = self
            .request(reqwest::Method::POST, &format!("/{index}/_delete_by_query"))
            .json(&query)
            .send()
            .await
            .with_context(|| format!("delete-by-query on {index}"))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn do_update_by_query(&self, index: &str, body: Value) -> anyhow::Result<()> {
        let response = self
            .request(reqwest::Method::POST, &format!("/{index}/_update_by_query"))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("update-by-query on {index}"))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn check_and_create_template(&self, name: &str, template: &[u8]) -> anyhow::Result<()> {
        let path = format!("/_template/{name}");
        if self.exists(&path).await? {
            debug!("template {name} already exists");
            return Ok(());
        }

        let response = self
            .request(reqwest::Method::PUT, &path)
            .header("Content-Type", "application/json")
            .body(template.to_vec())
            .send()
            .await
            .with_context(|| format!("creating template {name}"))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn check_and_create_policy(&self, name: &str, _policy: &[u8]) -> anyhow::Result<()> {
        // policies are accepted but not applied until index rotation is
        // reconciled with chain forks
        debug!("skipping policy {name}");
        Ok(())
    }

    async fn check_and_create_index(&self, index: &str) -> anyhow::Result<()> {
        let path = format!("/{index}-{INDEX_SUFFIX}");
        if self.exists(&path).await? {
            return Ok(());
        }

        let response = self
            .request(reqwest::Method::PUT, &path)
            .send()
            .await
            .with_context(|| format!("creating index {index}"))?;
        self.check_status(response).await?;
        Ok(())
    }

    async fn check_and_create_alias(&self, alias: &str, index: &str) -> anyhow::Result<()> {
        if self.exists(&format!("/_alias/{alias}")).await? {
            return Ok(());
        }

        let body = json!({
            "actions": [
                {"add": {"index": index, "alias": alias}}
            ]
        });
        let response = self
            .request(reqwest::Method::POST, "/_aliases")
            .json(&body)
            .send()
            .await
            .with_context(|| format!("creating alias {alias}"))?;
        self.check_status(response).await?;
        Ok(())
    }
}

/// Builds the query body used by delete-by-query rollbacks over a set of
/// document ids.
pub fn hashes_query(hashes: &[String]) -> Value {
    json!({
        "query": {
            "ids": {
                "values": hashes
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_url_is_rejected() {
        assert!(ElasticClient::new("", "", "").is_err());
        assert!(ElasticClient::new("http://localhost:9200", "", "").is_ok());
    }

    #[test]
    fn hashes_query_lists_ids() {
        let query = hashes_query(&["aa".to_string(), "bb".to_string()]);
        assert_eq!(query["query"]["ids"]["values"][1], "bb");
    }
}
