use std::cmp::Ordering;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::Reranker;
use crate::core::errors::SearchError;

pub const DEFAULT_JINA_URL: &str = "https://api.jina.ai/v1/rerank";
const DEFAULT_JINA_MODEL: &str = "jina-reranker-v2-base-multilingual";

/// Variant B: delegates scoring to the Jina rerank endpoint.
pub struct JinaReranker {
    endpoint: String,
    api_key: String,
    model: String,
    client: Client,
}

impl JinaReranker {
    pub fn new(api_key: impl Into<String>) -> Self {
        JinaReranker {
            endpoint: DEFAULT_JINA_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_JINA_MODEL.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankRow>,
}

#[derive(Deserialize)]
struct RerankRow {
    index: usize,
    relevance_score: f64,
}

#[async_trait]
impl Reranker for JinaReranker {
    fn name(&self) -> &str {
        "jina"
    }

    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<String>, SearchError> {
        if documents.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "query": query,
                "documents": documents,
                "top_n": top_k,
            }))
            .send()
            .await
            .map_err(SearchError::rerank)?;
        if !response.status().is_success() {
            return Err(SearchError::Rerank(format!(
                "rerank request failed: {}",
                response.status()
            )));
        }

        let payload: RerankResponse = response.json().await.map_err(SearchError::rerank)?;
        let mut rows = payload.results;
        rows.sort_by(|left, right| {
            right
                .relevance_score
                .partial_cmp(&left.relevance_score)
                .unwrap_or(Ordering::Equal)
        });

        Ok(rows
            .into_iter()
            .filter_map(|row| documents.get(row.index).cloned())
            .take(top_k)
            .collect())
    }
}
