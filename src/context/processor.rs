use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SourceProcessorConfig;
use crate::context::chunker::Chunker;
use crate::core::errors::SearchError;
use crate::ranking::embedding::EmbeddingReranker;
use crate::ranking::jina::JinaReranker;
use crate::ranking::{Reranker, RerankerKind};
use crate::scrape::http::HttpScraper;
use crate::scrape::{Scraper, NO_EXTRACTION};
use crate::search::results::SearchResultSet;

const WIKIPEDIA_MARKER: &str = "wikipedia.org";

/// Construction-time knobs for a [`SourceProcessor`]. Values left at `None`
/// fall back to the `source_processor` config section.
#[derive(Debug, Clone)]
pub struct ProcessorOptions {
    pub top_results: Option<usize>,
    pub strategies: Vec<String>,
    pub filter_content: bool,
    pub reranker: RerankerKind,
}

impl Default for ProcessorOptions {
    fn default() -> Self {
        ProcessorOptions {
            top_results: None,
            strategies: vec![NO_EXTRACTION.to_string()],
            filter_content: true,
            reranker: RerankerKind::Infinity,
        }
    }
}

/// Why a `process_sources` call handed the input back untouched.
#[derive(Debug)]
pub enum UnchangedReason {
    /// `num_elements` selected nothing (zero window or no usable links).
    NoCandidates,
    /// Economy mode found no Wikipedia link among the candidates.
    ModeFilterMiss,
    /// The batch fetch (or anything before it) failed.
    Failed(SearchError),
}

/// The result of one pipeline run. `Unchanged` is a defined degraded path,
/// not an error: callers branch on the tag instead of probing whether any
/// `html` field happens to be filled.
#[derive(Debug)]
pub enum ProcessOutcome {
    Enriched(SearchResultSet),
    Unchanged {
        sources: SearchResultSet,
        reason: UnchangedReason,
    },
}

impl ProcessOutcome {
    pub fn is_enriched(&self) -> bool {
        matches!(self, ProcessOutcome::Enriched(_))
    }

    pub fn sources(&self) -> &SearchResultSet {
        match self {
            ProcessOutcome::Enriched(sources) => sources,
            ProcessOutcome::Unchanged { sources, .. } => sources,
        }
    }

    pub fn into_inner(self) -> SearchResultSet {
        match self {
            ProcessOutcome::Enriched(sources) => sources,
            ProcessOutcome::Unchanged { sources, .. } => sources,
        }
    }
}

/// Turns raw search results into query-relevant context: fetch each candidate
/// page, chunk its text, rerank the chunks, and attach the top results back
/// onto the source records.
pub struct SourceProcessor {
    scraper: Arc<dyn Scraper>,
    reranker: Arc<dyn Reranker>,
    chunker: Chunker,
    top_results: usize,
}

impl SourceProcessor {
    pub fn new(
        options: ProcessorOptions,
        config: &SourceProcessorConfig,
    ) -> Result<Self, SearchError> {
        let scraper: Arc<dyn Scraper> = Arc::new(HttpScraper::new(
            options.strategies.clone(),
            options.filter_content,
        )?);
        let reranker: Arc<dyn Reranker> = match options.reranker {
            RerankerKind::Infinity => Arc::new(EmbeddingReranker::default()),
            RerankerKind::Jina => {
                let api_key = std::env::var("JINA_API_KEY")
                    .map_err(|_| SearchError::Config("JINA_API_KEY is not set".to_string()))?;
                Arc::new(JinaReranker::new(api_key))
            }
        };
        Self::with_components(scraper, reranker, options, config)
    }

    /// Inject scraper and reranker directly; used by tests and by callers
    /// that bring their own backends.
    pub fn with_components(
        scraper: Arc<dyn Scraper>,
        reranker: Arc<dyn Reranker>,
        options: ProcessorOptions,
        config: &SourceProcessorConfig,
    ) -> Result<Self, SearchError> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        Ok(SourceProcessor {
            scraper,
            reranker,
            chunker,
            top_results: options.top_results.unwrap_or(config.top_results),
        })
    }

    pub fn top_results(&self) -> usize {
        self.top_results
    }

    /// Enrich up to `num_elements` organic sources with query-relevant page
    /// content. With `pro_mode` off only a Wikipedia source qualifies; with
    /// `chunk` off the raw page text is attached verbatim instead of being
    /// chunked and reranked. Never returns an error: a failed run hands the
    /// input back tagged with the reason.
    pub async fn process_sources(
        &self,
        sources: SearchResultSet,
        num_elements: usize,
        query: &str,
        pro_mode: bool,
        chunk: bool,
    ) -> ProcessOutcome {
        let candidates = valid_sources(&sources, num_elements);
        if candidates.is_empty() {
            debug!("no candidate sources in the first {num_elements} results");
            return ProcessOutcome::Unchanged {
                sources,
                reason: UnchangedReason::NoCandidates,
            };
        }

        let candidates = if pro_mode {
            candidates
        } else {
            // Economy mode: one encyclopedia page is the whole budget, so
            // even when several Wikipedia links match only the first is
            // fetched.
            match candidates
                .into_iter()
                .find(|(_, link)| link.contains(WIKIPEDIA_MARKER))
            {
                Some(hit) => vec![hit],
                None => {
                    debug!("economy mode: no Wikipedia source among candidates");
                    return ProcessOutcome::Unchanged {
                        sources,
                        reason: UnchangedReason::ModeFilterMiss,
                    };
                }
            }
        };

        let links: Vec<String> = candidates.iter().map(|(_, link)| link.clone()).collect();
        let pages = match self.scraper.scrape_many(&links).await {
            Ok(pages) => pages,
            Err(err) => {
                warn!("batch fetch failed, returning input untouched: {err}");
                return ProcessOutcome::Unchanged {
                    sources,
                    reason: UnchangedReason::Failed(err),
                };
            }
        };

        let mut sources = sources;
        for (index, link) in candidates {
            let content = pages
                .get(&link)
                .and_then(|page| page.content(NO_EXTRACTION))
                .unwrap_or_default();
            let html = if chunk {
                self.rank_content(content, query).await
            } else {
                vec![content.to_string()]
            };
            if let Some(source) = sources.organic.get_mut(index) {
                source.html = html;
            }
        }
        ProcessOutcome::Enriched(sources)
    }

    /// Chunk and rerank one page. A failure here voids only this source;
    /// the rest of the batch proceeds.
    async fn rank_content(&self, content: &str, query: &str) -> Vec<String> {
        if content.is_empty() {
            debug!("empty page content, nothing to rank");
            return Vec::new();
        }
        let chunks = self.chunker.split(content);
        match self.reranker.rerank(query, &chunks, self.top_results).await {
            Ok(ranked) => ranked,
            Err(err) => {
                warn!("content processing failed for one source: {err}");
                Vec::new()
            }
        }
    }
}

/// The first `num_elements` organic entries with a usable link, original
/// index preserved.
fn valid_sources(sources: &SearchResultSet, num_elements: usize) -> Vec<(usize, String)> {
    sources
        .organic
        .iter()
        .enumerate()
        .take(num_elements)
        .filter(|(_, source)| !source.link.is_empty())
        .map(|(index, source)| (index, source.link.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::scrape::ScrapedPage;
    use crate::search::results::Source;

    /// Serves canned page text per link.
    struct MockScraper {
        pages: HashMap<String, String>,
    }

    impl MockScraper {
        fn new(pages: &[(&str, &str)]) -> Arc<Self> {
            Arc::new(MockScraper {
                pages: pages
                    .iter()
                    .map(|(link, text)| (link.to_string(), text.to_string()))
                    .collect(),
            })
        }
    }

    #[async_trait]
    impl Scraper for MockScraper {
        async fn scrape_many(
            &self,
            links: &[String],
        ) -> Result<HashMap<String, ScrapedPage>, SearchError> {
            Ok(links
                .iter()
                .map(|link| {
                    let text = self.pages.get(link).cloned().unwrap_or_default();
                    (link.clone(), ScrapedPage::with_strategy(NO_EXTRACTION, text))
                })
                .collect())
        }
    }

    struct FailingScraper;

    #[async_trait]
    impl Scraper for FailingScraper {
        async fn scrape_many(
            &self,
            _links: &[String],
        ) -> Result<HashMap<String, ScrapedPage>, SearchError> {
            Err(SearchError::Scrape("connection refused".to_string()))
        }
    }

    /// Passes documents through in order, truncated to `top_k`, counting
    /// backend invocations.
    struct PassthroughReranker {
        calls: AtomicUsize,
    }

    impl PassthroughReranker {
        fn new() -> Arc<Self> {
            Arc::new(PassthroughReranker {
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Reranker for PassthroughReranker {
        fn name(&self) -> &str {
            "passthrough"
        }

        async fn rerank(
            &self,
            _query: &str,
            documents: &[String],
            top_k: usize,
        ) -> Result<Vec<String>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(documents.iter().take(top_k).cloned().collect())
        }
    }

    struct FailingReranker;

    #[async_trait]
    impl Reranker for FailingReranker {
        fn name(&self) -> &str {
            "failing"
        }

        async fn rerank(
            &self,
            _query: &str,
            _documents: &[String],
            _top_k: usize,
        ) -> Result<Vec<String>, SearchError> {
            Err(SearchError::Rerank("backend unavailable".to_string()))
        }
    }

    fn small_config() -> SourceProcessorConfig {
        SourceProcessorConfig {
            top_results: 5,
            chunk_size: 16,
            chunk_overlap: 4,
        }
    }

    fn processor(scraper: Arc<dyn Scraper>, reranker: Arc<dyn Reranker>) -> SourceProcessor {
        SourceProcessor::with_components(
            scraper,
            reranker,
            ProcessorOptions::default(),
            &small_config(),
        )
        .expect("processor")
    }

    fn result_set(links: &[&str]) -> SearchResultSet {
        SearchResultSet::new(links.iter().map(|link| Source::new(*link)).collect())
    }

    #[tokio::test]
    async fn zero_window_returns_input_untouched() {
        let input = result_set(&["https://en.wikipedia.org/wiki/Rust"]);
        let proc = processor(MockScraper::new(&[]), PassthroughReranker::new());

        let outcome = proc
            .process_sources(input.clone(), 0, "rust", false, true)
            .await;

        match outcome {
            ProcessOutcome::Unchanged {
                sources,
                reason: UnchangedReason::NoCandidates,
            } => assert_eq!(sources, input),
            other => panic!("expected NoCandidates, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn economy_mode_without_wikipedia_is_a_filter_miss() {
        let input = result_set(&["https://example.com/a", "https://example.com/b"]);
        let proc = processor(MockScraper::new(&[]), PassthroughReranker::new());

        let outcome = proc
            .process_sources(input.clone(), 2, "anything", false, true)
            .await;

        match outcome {
            ProcessOutcome::Unchanged {
                sources,
                reason: UnchangedReason::ModeFilterMiss,
            } => assert_eq!(sources, input),
            other => panic!("expected ModeFilterMiss, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn economy_mode_enriches_only_the_wikipedia_source() {
        let wiki = "https://en.wikipedia.org/wiki/Rust";
        let input = result_set(&["https://example.com", wiki]);
        let proc = processor(
            MockScraper::new(&[(wiki, "Rust is a systems programming language.")]),
            PassthroughReranker::new(),
        );

        let enriched = proc
            .process_sources(input, 2, "rust language", false, true)
            .await
            .into_inner();

        assert!(enriched.organic[0].html.is_empty());
        assert!(!enriched.organic[1].html.is_empty());
        assert!(enriched.organic[1].html.len() <= proc.top_results());
        assert_eq!(enriched.processed_count(), 1);
    }

    #[tokio::test]
    async fn economy_mode_with_two_wikipedia_links_fetches_only_the_first() {
        let first = "https://en.wikipedia.org/wiki/First";
        let second = "https://en.wikipedia.org/wiki/Second";
        let input = result_set(&[first, second]);
        let proc = processor(
            MockScraper::new(&[(first, "first page"), (second, "second page")]),
            PassthroughReranker::new(),
        );

        let enriched = proc
            .process_sources(input, 2, "query", false, true)
            .await
            .into_inner();

        assert!(!enriched.organic[0].html.is_empty());
        assert!(enriched.organic[1].html.is_empty());
    }

    #[tokio::test]
    async fn pro_mode_enriches_all_candidates_in_the_window() {
        let a = "https://example.com/a";
        let b = "https://example.com/b";
        let c = "https://example.com/c";
        let input = result_set(&[a, b, c]);
        let proc = processor(
            MockScraper::new(&[(a, "alpha text"), (b, "beta text"), (c, "gamma text")]),
            PassthroughReranker::new(),
        );

        let enriched = proc
            .process_sources(input, 2, "query", true, true)
            .await
            .into_inner();

        assert!(!enriched.organic[0].html.is_empty());
        assert!(!enriched.organic[1].html.is_empty());
        // Outside the candidate window.
        assert!(enriched.organic[2].html.is_empty());
    }

    #[tokio::test]
    async fn chunk_false_attaches_verbatim_content() {
        let link = "https://example.com/raw";
        let input = result_set(&[link]);
        let reranker = PassthroughReranker::new();
        let proc = processor(
            MockScraper::new(&[(link, "verbatim page text")]),
            reranker.clone(),
        );

        let enriched = proc
            .process_sources(input, 1, "query", true, false)
            .await
            .into_inner();

        assert_eq!(enriched.organic[0].html, vec!["verbatim page text"]);
        assert_eq!(reranker.call_count(), 0);
    }

    #[tokio::test]
    async fn fetch_failure_returns_input_untouched() {
        let input = result_set(&["https://en.wikipedia.org/wiki/Rust"]);
        let proc = processor(Arc::new(FailingScraper), PassthroughReranker::new());

        let outcome = proc
            .process_sources(input.clone(), 1, "rust", false, true)
            .await;

        match outcome {
            ProcessOutcome::Unchanged {
                sources,
                reason: UnchangedReason::Failed(SearchError::Scrape(_)),
            } => assert_eq!(sources, input),
            other => panic!("expected Failed(Scrape), got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rerank_failure_voids_only_that_source() {
        let a = "https://example.com/a";
        let b = "https://example.com/b";
        let input = result_set(&[a, b]);
        let proc = processor(
            MockScraper::new(&[(a, "alpha text"), (b, "beta text")]),
            Arc::new(FailingReranker),
        );

        let outcome = proc.process_sources(input, 2, "query", true, true).await;
        assert!(outcome.is_enriched());

        let enriched = outcome.into_inner();
        assert!(enriched.organic[0].html.is_empty());
        assert!(enriched.organic[1].html.is_empty());
    }

    #[tokio::test]
    async fn empty_page_content_skips_the_reranker() {
        let link = "https://en.wikipedia.org/wiki/Empty";
        let input = result_set(&[link]);
        let reranker = PassthroughReranker::new();
        let proc = processor(MockScraper::new(&[(link, "")]), reranker.clone());

        let enriched = proc
            .process_sources(input, 1, "query", false, true)
            .await
            .into_inner();

        assert!(enriched.organic[0].html.is_empty());
        assert_eq!(reranker.call_count(), 0);
    }

    #[tokio::test]
    async fn sources_with_empty_links_are_skipped() {
        let wiki = "https://en.wikipedia.org/wiki/Kept";
        let mut input = result_set(&["", wiki]);
        input.organic[0].extra.insert(
            "title".to_string(),
            serde_json::Value::String("linkless".to_string()),
        );
        let proc = processor(
            MockScraper::new(&[(wiki, "kept page text")]),
            PassthroughReranker::new(),
        );

        let enriched = proc
            .process_sources(input, 2, "query", false, true)
            .await
            .into_inner();

        assert!(enriched.organic[0].html.is_empty());
        assert!(!enriched.organic[1].html.is_empty());
    }

    #[tokio::test]
    async fn processing_preserves_order_and_passthrough_fields() {
        let wiki = "https://en.wikipedia.org/wiki/Rust";
        let other = "https://example.com";
        let mut input = result_set(&[wiki, other]);
        input.organic[1].extra.insert(
            "snippet".to_string(),
            serde_json::Value::String("kept".to_string()),
        );
        let snapshot = input.clone();

        let proc = processor(
            MockScraper::new(&[(wiki, "page text long enough to chunk twice over.")]),
            PassthroughReranker::new(),
        );
        let enriched = proc
            .process_sources(input, 2, "query", false, true)
            .await
            .into_inner();

        assert_eq!(enriched.organic.len(), snapshot.organic.len());
        assert_eq!(enriched.organic[0].link, snapshot.organic[0].link);
        assert_eq!(enriched.organic[1], snapshot.organic[1]);
    }
}
