use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{similarity, Reranker};
use crate::core::errors::SearchError;

pub const DEFAULT_INFINITY_URL: &str = "http://localhost:7997";
const DEFAULT_EMBED_MODEL: &str = "BAAI/bge-base-en-v1.5";

/// Batch text-embedding capability behind Variant A. Kept as a seam so the
/// reranking math is testable without a running server.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// One embedding per input, in input order.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, SearchError>;
}

/// OpenAI-style `/embeddings` client for a local Infinity server.
#[derive(Clone)]
pub struct InfinityEmbeddings {
    base_url: String,
    model: String,
    client: Client,
}

impl InfinityEmbeddings {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        InfinityEmbeddings {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: Client::new(),
        }
    }
}

impl Default for InfinityEmbeddings {
    fn default() -> Self {
        InfinityEmbeddings::new(DEFAULT_INFINITY_URL, DEFAULT_EMBED_MODEL)
    }
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for InfinityEmbeddings {
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
        let url = format!("{}/embeddings", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "model": self.model, "input": inputs }))
            .send()
            .await
            .map_err(SearchError::rerank)?;
        if !response.status().is_success() {
            return Err(SearchError::Rerank(format!(
                "embedding request failed: {}",
                response.status()
            )));
        }

        let payload: EmbeddingsResponse = response.json().await.map_err(SearchError::rerank)?;
        let mut rows = payload.data;
        rows.sort_by_key(|row| row.index);
        Ok(rows.into_iter().map(|row| row.embedding).collect())
    }
}

/// Variant A: embeds the query and every document in one batch, then ranks
/// documents by cosine similarity to the query. Deterministic for fixed
/// embeddings.
pub struct EmbeddingReranker {
    provider: Arc<dyn EmbeddingProvider>,
}

impl EmbeddingReranker {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        EmbeddingReranker { provider }
    }
}

impl Default for EmbeddingReranker {
    fn default() -> Self {
        EmbeddingReranker::new(Arc::new(InfinityEmbeddings::default()))
    }
}

#[async_trait]
impl Reranker for EmbeddingReranker {
    fn name(&self) -> &str {
        "infinity"
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

        let mut inputs = Vec::with_capacity(documents.len() + 1);
        inputs.push(query.to_string());
        inputs.extend(documents.iter().cloned());

        let embeddings = self.provider.embed(&inputs).await?;
        if embeddings.len() != inputs.len() {
            return Err(SearchError::Rerank(format!(
                "embedding count mismatch: {} != {}",
                embeddings.len(),
                inputs.len()
            )));
        }

        let ranking = similarity::rank_descending(&embeddings[0], &embeddings[1..])?;
        Ok(ranking
            .into_iter()
            .take(top_k)
            .map(|(idx, _)| documents[idx].clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Maps known strings to fixed vectors and counts backend invocations.
    struct FakeEmbeddings {
        calls: AtomicUsize,
    }

    impl FakeEmbeddings {
        fn new() -> Arc<Self> {
            Arc::new(FakeEmbeddings {
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(inputs
                .iter()
                .map(|input| match input.as_str() {
                    "query" => vec![1.0, 0.0],
                    "close" => vec![0.9, 0.1],
                    "middle" => vec![0.5, 0.5],
                    "far" => vec![0.0, 1.0],
                    _ => vec![0.1, 0.1],
                })
                .collect())
        }
    }

    fn docs(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[tokio::test]
    async fn orders_documents_by_similarity_to_query() {
        let provider = FakeEmbeddings::new();
        let reranker = EmbeddingReranker::new(provider.clone());

        let ranked = reranker
            .rerank("query", &docs(&["far", "close", "middle"]), 3)
            .await
            .expect("rerank");

        assert_eq!(ranked, docs(&["close", "middle", "far"]));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn truncates_to_top_k() {
        let reranker = EmbeddingReranker::new(FakeEmbeddings::new());
        let ranked = reranker
            .rerank("query", &docs(&["far", "close", "middle"]), 2)
            .await
            .expect("rerank");
        assert_eq!(ranked, docs(&["close", "middle"]));
    }

    #[tokio::test]
    async fn returns_all_documents_when_fewer_than_top_k() {
        let reranker = EmbeddingReranker::new(FakeEmbeddings::new());
        let ranked = reranker
            .rerank("query", &docs(&["close", "far"]), 10)
            .await
            .expect("rerank");
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn empty_documents_skip_the_backend() {
        let provider = FakeEmbeddings::new();
        let reranker = EmbeddingReranker::new(provider.clone());

        let ranked = reranker.rerank("query", &[], 5).await.expect("rerank");
        assert!(ranked.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn zero_top_k_skips_the_backend() {
        let provider = FakeEmbeddings::new();
        let reranker = EmbeddingReranker::new(provider.clone());

        let ranked = reranker
            .rerank("query", &docs(&["close"]), 0)
            .await
            .expect("rerank");
        assert!(ranked.is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn score_ties_keep_document_order() {
        let reranker = EmbeddingReranker::new(FakeEmbeddings::new());
        let ranked = reranker
            .rerank("query", &docs(&["dup a", "dup b"]), 2)
            .await
            .expect("rerank");
        assert_eq!(ranked, docs(&["dup a", "dup b"]));
    }
}
