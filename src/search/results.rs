use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One organic search hit. Fields the upstream search API attaches beyond
/// `link` (title, snippet, position, ...) pass through untouched in `extra`.
///
/// `html` is the output slot of the processing pipeline: empty until a
/// processor fills it with ranked chunks (or the verbatim page text when
/// chunking is disabled). Identity is the position in the organic sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub link: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub html: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Source {
    pub fn new(link: impl Into<String>) -> Self {
        Source {
            link: link.into(),
            html: Vec::new(),
            extra: Map::new(),
        }
    }

    /// Whether the pipeline attached any context to this source. Unset means
    /// "no additional context available", never an error.
    pub fn is_processed(&self) -> bool {
        !self.html.is_empty()
    }
}

/// The typed result container: the ranked organic hits plus whatever other
/// top-level keys the search response carried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    #[serde(default)]
    pub organic: Vec<Source>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SearchResultSet {
    pub fn new(organic: Vec<Source>) -> Self {
        SearchResultSet {
            organic,
            extra: Map::new(),
        }
    }

    pub fn processed_count(&self) -> usize {
        self.organic.iter().filter(|s| s.is_processed()).count()
    }
}
