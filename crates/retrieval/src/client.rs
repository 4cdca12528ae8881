//! Retrieval service client.
//!
//! One bounded-timeout call per request, no retry, no fallback evidence.
//! Any transport, status, or decode failure surfaces as
//! `AppError::Retrieval` and aborts the pipeline.

use async_trait::async_trait;
use citegate_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::Hit;

/// Hard upper bound on a retrieval call.
pub const RETRIEVAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Wire request for the retrieval service's search endpoint.
#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    k: usize,
}

/// Wire response from the retrieval service.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<Hit>,
}

/// Trait for retrieval backends.
///
/// Abstracts the retrieval service behind a request/response contract so the
/// pipeline can be exercised against deterministic implementations in tests.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch up to `k` ranked hits for a query.
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Hit>>;
}

/// HTTP retrieval client.
pub struct HttpRetriever {
    base_url: String,
    client: reqwest::Client,
}

impl HttpRetriever {
    /// Create a client for a retrieval service base URL.
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(RETRIEVAL_TIMEOUT)
            .build()
            .map_err(|e| AppError::Retrieval(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn search(&self, query: &str, k: usize) -> AppResult<Vec<Hit>> {
        let url = format!("{}/search", self.base_url);
        tracing::debug!(url = %url, k = k, "Calling retrieval service");

        let response = self
            .client
            .post(&url)
            .json(&SearchRequest { query, k })
            .send()
            .await
            .map_err(|e| AppError::Retrieval(format!("Request to retriever failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Retrieval(format!(
                "Retriever returned {}: {}",
                status, body
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Retrieval(format!("Failed to parse retriever response: {}", e)))?;

        tracing::debug!(hits = parsed.hits.len(), "Retrieval complete");
        Ok(parsed.hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_wire_shape() {
        let request = SearchRequest {
            query: "how do I deploy?",
            k: 4,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["query"], "how do I deploy?");
        assert_eq!(json["k"], 4);
    }

    #[test]
    fn test_search_response_parses_hits() {
        let raw = r#"{"hits": [{"text": "hello", "meta": {"doc_id": "A", "section": "intro"}}]}"#;
        let parsed: SearchResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.hits.len(), 1);
        assert_eq!(parsed.hits[0].label(), "A#intro");
    }

    #[test]
    fn test_search_response_defaults_to_empty_hits() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.hits.is_empty());
    }

    #[test]
    fn test_client_creation() {
        assert!(HttpRetriever::new("http://localhost:8001").is_ok());
    }
}
