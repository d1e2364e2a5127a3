use serde::Deserialize;

pub const NUM_ERRORS_TO_EXTRACT: usize = 5;

/// The shape of a `_bulk` response; only the error information is read.
#[derive(Debug, Default, Deserialize)]
pub struct BulkRequestResponse {
    #[serde(default)]
    pub errors: bool,
    #[serde(default)]
    pub items: Vec<BulkResponseEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkResponseEntry {
    #[serde(default)]
    pub index: Option<BulkResponseItem>,
    #[serde(default)]
    pub update: Option<BulkResponseItem>,
    #[serde(default)]
    pub delete: Option<BulkResponseItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkResponseItem {
    #[serde(default)]
    pub status: u16,
    #[serde(default)]
    pub error: Option<BulkItemError>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BulkItemError {
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub reason: String,
}

impl BulkRequestResponse {
    /// Collects up to [NUM_ERRORS_TO_EXTRACT] item error reasons for the log
    /// record and the returned error.
    pub fn extract_error_reasons(&self) -> Vec<String> {
        let mut reasons = Vec::new();
        for entry in &self.items {
            for item in [&entry.index, &entry.update, &entry.delete]
                .into_iter()
                .flatten()
            {
                if let Some(error) = &item.error {
                    reasons.push(format!(
                        "status {}: {} ({})",
                        item.status, error.reason, error.kind
                    ));
                    if reasons.len() == NUM_ERRORS_TO_EXTRACT {
                        return reasons;
                    }
                }
            }
        }
        reasons
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_item_errors_from_mixed_response() {
        let raw = r#"{
            "errors": true,
            "items": [
                {"index": {"status": 201}},
                {"update": {"status": 404, "error": {"type": "document_missing_exception", "reason": "not found"}}},
                {"delete": {"status": 200}}
            ]
        }"#;
        let response: BulkRequestResponse = serde_json::from_str(raw).unwrap();
        assert!(response.errors);

        let reasons = response.extract_error_reasons();
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("document_missing_exception"));
    }
}
