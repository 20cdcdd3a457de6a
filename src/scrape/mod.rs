pub mod http;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::errors::SearchError;

/// Strategy name for raw page text with no structured extraction applied.
pub const NO_EXTRACTION: &str = "no_extraction";

/// Text produced by one extraction strategy for one page.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub content: String,
}

/// All extraction strategies run against one page, keyed by strategy name.
#[derive(Debug, Clone, Default)]
pub struct ScrapedPage {
    strategies: HashMap<String, ExtractionResult>,
}

impl ScrapedPage {
    pub fn with_strategy(strategy: impl Into<String>, content: impl Into<String>) -> Self {
        let mut page = ScrapedPage::default();
        page.insert(
            strategy,
            ExtractionResult {
                content: content.into(),
            },
        );
        page
    }

    pub fn insert(&mut self, strategy: impl Into<String>, result: ExtractionResult) {
        self.strategies.insert(strategy.into(), result);
    }

    pub fn content(&self, strategy: &str) -> Option<&str> {
        self.strategies.get(strategy).map(|r| r.content.as_str())
    }
}

/// The scrape contract the source processor consumes. One call covers the
/// whole candidate batch; how a backend fans out across links is its own
/// business.
#[async_trait]
pub trait Scraper: Send + Sync {
    async fn scrape_many(
        &self,
        links: &[String],
    ) -> Result<HashMap<String, ScrapedPage>, SearchError>;
}
