//! Chroma retrieval adapter
//!
//! Implements the application's `RetrievalGateway` port against a
//! Chroma-style `collections/{name}/query` endpoint. The nested response
//! arrays (one inner list per query text) are flattened into raw chunks;
//! hit normalization happens in the domain layer.

use async_trait::async_trait;
use finqa_application::ports::retrieval_gateway::{RawChunk, RetrievalError, RetrievalGateway};
use finqa_domain::retrieval::RetrievalFilter;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Retrieval gateway speaking the Chroma query protocol.
pub struct ChromaRetrievalGateway {
    client: reqwest::Client,
    base_url: String,
    collection: String,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query_texts: [&'a str; 1],
    n_results: usize,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    where_filter: Option<&'a RetrievalFilter>,
}

#[derive(Deserialize)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    #[serde(default)]
    documents: Vec<Vec<Option<String>>>,
    #[serde(default)]
    metadatas: Vec<Vec<Option<Map<String, Value>>>>,
}

impl ChromaRetrievalGateway {
    pub fn new(
        base_url: impl Into<String>,
        collection: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RetrievalError::Connection(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            collection: collection.into(),
        })
    }

    fn map_transport_error(err: reqwest::Error) -> RetrievalError {
        if err.is_connect() || err.is_timeout() {
            RetrievalError::Connection(err.to_string())
        } else {
            RetrievalError::Backend(err.to_string())
        }
    }
}

#[async_trait]
impl RetrievalGateway for ChromaRetrievalGateway {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&RetrievalFilter>,
    ) -> Result<Vec<RawChunk>, RetrievalError> {
        let request = QueryRequest {
            query_texts: [query],
            n_results: top_k,
            where_filter: filter.filter(|f| !f.is_empty()),
        };

        let url = format!(
            "{}/api/v1/collections/{}/query",
            self.base_url, self.collection
        );
        debug!(collection = %self.collection, top_k, "vector query");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(Self::map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::RateLimited(format!("{status}: {body}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Backend(format!("{status}: {body}")));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Backend(format!("malformed query response: {e}")))?;

        Ok(flatten_response(parsed))
    }
}

/// Zip the per-query nested arrays into flat chunks. Only one query text is
/// ever sent, so only the first inner list matters.
fn flatten_response(response: QueryResponse) -> Vec<RawChunk> {
    let ids = response.ids.into_iter().next().unwrap_or_default();
    let mut documents = response
        .documents
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter();
    let mut metadatas = response
        .metadatas
        .into_iter()
        .next()
        .unwrap_or_default()
        .into_iter();

    ids.into_iter()
        .map(|id| RawChunk {
            id,
            text: documents.next().flatten().unwrap_or_default(),
            metadata: metadatas.next().flatten().unwrap_or_default(),
        })
        .collect()
}
