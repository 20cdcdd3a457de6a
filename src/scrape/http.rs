use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use reqwest::Client;

use super::{ExtractionResult, ScrapedPage, Scraper};
use crate::core::errors::SearchError;

const FETCH_TIMEOUT_SECS: u64 = 30;

/// Reference scraper: a plain GET per link, no browser rendering. With
/// `filter_content` set, markup and script/style bodies are stripped before
/// the text is handed downstream.
pub struct HttpScraper {
    client: Client,
    strategies: Vec<String>,
    filter_content: bool,
}

impl HttpScraper {
    pub fn new(strategies: Vec<String>, filter_content: bool) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .build()
            .map_err(SearchError::internal)?;
        Ok(HttpScraper {
            client,
            strategies,
            filter_content,
        })
    }

    async fn fetch(&self, link: &str) -> Result<String, SearchError> {
        let response = self
            .client
            .get(link)
            .send()
            .await
            .map_err(SearchError::scrape)?;
        if !response.status().is_success() {
            return Err(SearchError::Scrape(format!(
                "{link}: {}",
                response.status()
            )));
        }
        let body = response.text().await.map_err(SearchError::scrape)?;
        Ok(if self.filter_content {
            strip_html_tags(&body)
        } else {
            body
        })
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    async fn scrape_many(
        &self,
        links: &[String],
    ) -> Result<HashMap<String, ScrapedPage>, SearchError> {
        let bodies = join_all(links.iter().map(|link| self.fetch(link))).await;

        let mut pages = HashMap::with_capacity(links.len());
        for (link, body) in links.iter().zip(bodies) {
            let text = body?;
            let mut page = ScrapedPage::default();
            for strategy in &self.strategies {
                page.insert(
                    strategy.clone(),
                    ExtractionResult {
                        content: text.clone(),
                    },
                );
            }
            pages.insert(link.clone(), page);
        }
        Ok(pages)
    }
}

/// Drop tags and the bodies of script/style elements, then collapse the
/// leftover whitespace into trimmed non-empty lines.
fn strip_html_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 4);
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        if let Some(name) = ["script", "style"].iter().find(|n| tag_opens(tail, n)) {
            let close = format!("</{name}");
            rest = match find_ci(tail, &close) {
                Some(pos) => {
                    let after = &tail[pos..];
                    match after.find('>') {
                        Some(gt) => &tail[pos + gt + 1..],
                        None => "",
                    }
                }
                None => "",
            };
        } else {
            rest = match tail.find('>') {
                Some(gt) => &tail[gt + 1..],
                None => "",
            };
        }
    }
    out.push_str(rest);

    let lines: Vec<&str> = out
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    lines.join("\n")
}

/// Does `tail` (starting at `<`) open the named element?
fn tag_opens(tail: &str, name: &str) -> bool {
    let bytes = tail.as_bytes();
    if bytes.len() <= name.len() + 1 {
        return false;
    }
    if !bytes[1..=name.len()].eq_ignore_ascii_case(name.as_bytes()) {
        return false;
    }
    // Reject longer element names sharing the prefix, e.g. <styled-box>.
    matches!(bytes[name.len() + 1], b'>' | b' ' | b'\t' | b'\n' | b'\r' | b'/')
}

fn find_ci(haystack: &str, needle: &str) -> Option<usize> {
    let h = haystack.as_bytes();
    let n = needle.as_bytes();
    if n.is_empty() || h.len() < n.len() {
        return None;
    }
    (0..=h.len() - n.len()).find(|&i| h[i..i + n.len()].eq_ignore_ascii_case(n))
}
