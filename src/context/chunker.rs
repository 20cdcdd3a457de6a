use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::core::errors::SearchError;

/// Splits page text into fixed-size overlapping windows. The unit is a
/// Unicode scalar, so multi-byte text never splits mid-character.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Chunker {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Requires `chunk_overlap < chunk_size`; anything else would stall or
    /// reverse the window stride.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, SearchError> {
        if chunk_size == 0 {
            return Err(SearchError::InvalidInput(
                "chunk_size must be positive".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(SearchError::InvalidInput(format!(
                "chunk_overlap {chunk_overlap} must be smaller than chunk_size {chunk_size}"
            )));
        }
        Ok(Chunker {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Windows of `chunk_size` chars advancing by `chunk_size - chunk_overlap`,
    /// so consecutive chunks share exactly `chunk_overlap` chars and the
    /// non-overlapping heads concatenate back to the input.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let stride = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += stride;
        }
        chunks
    }
}
