use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("scrape failed: {0}")]
    Scrape(String),
    #[error("rerank failed: {0}")]
    Rerank(String),
    #[error("config error: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        SearchError::Internal(err.to_string())
    }

    pub fn scrape<E: std::fmt::Display>(err: E) -> Self {
        SearchError::Scrape(err.to_string())
    }

    pub fn rerank<E: std::fmt::Display>(err: E) -> Self {
        SearchError::Rerank(err.to_string())
    }
}
