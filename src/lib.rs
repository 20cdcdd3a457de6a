//! Context building for deep-search agents.
//!
//! Takes the organic results of a web search, fetches the candidate pages,
//! splits their text into overlapping chunks, and reranks those chunks by
//! semantic relevance to the query, so the agent receives a bounded, ordered
//! context per source. [`context::SourceProcessor`] is the entry point;
//! [`eval`] carries the harness-level answer log and timeout primitives.

pub mod config;
pub mod context;
pub mod core;
pub mod eval;
pub mod logging;
pub mod ranking;
pub mod scrape;
pub mod search;

pub use crate::config::{Config, SourceProcessorConfig};
pub use crate::context::chunker::Chunker;
pub use crate::context::processor::{
    ProcessOutcome, ProcessorOptions, SourceProcessor, UnchangedReason,
};
pub use crate::core::errors::SearchError;
pub use crate::ranking::{Reranker, RerankerKind};
pub use crate::scrape::Scraper;
pub use crate::search::results::{SearchResultSet, Source};
