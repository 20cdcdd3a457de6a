use std::cmp::Ordering;

use ndarray::ArrayView1;

use crate::core::errors::SearchError;

pub fn cosine_similarity(query: &[f32], candidate: &[f32]) -> Result<f32, SearchError> {
    if query.is_empty() || candidate.is_empty() {
        return Err(SearchError::InvalidInput(
            "embedding vectors must not be empty".to_string(),
        ));
    }
    if query.len() != candidate.len() {
        return Err(SearchError::InvalidInput(format!(
            "embedding length mismatch: {} != {}",
            query.len(),
            candidate.len()
        )));
    }

    let q = ArrayView1::from(query);
    let c = ArrayView1::from(candidate);
    let denom = q.dot(&q).sqrt() * c.dot(&c).sqrt();
    if denom <= f32::EPSILON {
        return Ok(0.0);
    }
    Ok(q.dot(&c) / denom)
}

/// Indices of `candidates` ordered by descending cosine similarity to
/// `query`. The sort is stable, so ties keep input order.
pub fn rank_descending(
    query: &[f32],
    candidates: &[Vec<f32>],
) -> Result<Vec<(usize, f32)>, SearchError> {
    let mut scores = Vec::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        scores.push((idx, cosine_similarity(query, candidate)?));
    }
    scores.sort_by(|left, right| right.1.partial_cmp(&left.1).unwrap_or(Ordering::Equal));
    Ok(scores)
}
