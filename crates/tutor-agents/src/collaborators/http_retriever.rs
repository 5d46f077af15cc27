//! HTTP client for the retrieval service.

use async_trait::async_trait;
use coordination::{EvidenceChunk, RetrievalFilters};
use serde::{Deserialize, Serialize};

use super::Retriever;
use crate::errors::RetrievalError;

/// `POST {base_url}/retrieve` with `{query, filters, top_k}`.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: reqwest::Client,
    base_url: String,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/retrieve", self.base_url)
    }
}

#[derive(Serialize)]
struct RetrieveRequest<'a> {
    query: &'a str,
    filters: &'a RetrievalFilters,
    top_k: usize,
}

#[derive(Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    chunks: Vec<EvidenceChunk>,
}

#[async_trait]
impl Retriever for HttpRetriever {
    async fn retrieve(
        &self,
        query: &str,
        filters: &RetrievalFilters,
        top_k: usize,
    ) -> Result<Vec<EvidenceChunk>, RetrievalError> {
        let resp = self
            .client
            .post(self.endpoint())
            .json(&RetrieveRequest {
                query,
                filters,
                top_k,
            })
            .send()
            .await
            .map_err(|e| RetrievalError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RetrieveResponse = resp
            .json()
            .await
            .map_err(|e| RetrievalError::Decode(e.to_string()))?;
        // Never hand back more than asked for.
        let mut chunks = parsed.chunks;
        chunks.truncate(top_k);
        Ok(chunks)
    }
}
