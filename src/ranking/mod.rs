pub mod embedding;
pub mod jina;
pub mod similarity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::SearchError;

/// Which reranking backend a processor is built with. Chosen once at
/// construction; never inspected at call time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RerankerKind {
    /// Local embedding-similarity engine (Infinity server + cosine).
    #[default]
    Infinity,
    /// Remote reranking API.
    Jina,
}

/// Orders documents by estimated relevance to a query.
#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    /// At most `top_k` entries of `documents`, most relevant first. Empty
    /// `documents` or `top_k == 0` yield an empty vec without touching the
    /// backend.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<String>, SearchError>;
}
