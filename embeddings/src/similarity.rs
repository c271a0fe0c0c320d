//! Distance computation for embeddings.

use ordered_float::OrderedFloat;

use crate::error::{EmbeddingError, Result};

/// Compute the euclidean (L2) distance between two embeddings.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(EmbeddingError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let sum: f32 = a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum();

    Ok(sum.sqrt())
}

/// Find the `k` candidates closest to `query`.
///
/// Returns `(position, distance)` pairs in ascending distance. Candidates at
/// the same distance keep their iteration order, so callers that iterate in
/// insertion order get reproducible ties.
pub fn nearest_by_distance<'a, I>(query: &[f32], candidates: I, k: usize) -> Result<Vec<(usize, f32)>>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(OrderedFloat<f32>, usize)> = Vec::new();

    for (position, embedding) in candidates.into_iter().enumerate() {
        let distance = euclidean_distance(query, embedding)?;
        scored.push((OrderedFloat(distance), position));
    }

    // Stable sort keeps the original order among equal distances.
    scored.sort_by_key(|(distance, _)| *distance);

    Ok(scored
        .into_iter()
        .take(k)
        .map(|(distance, position)| (position, distance.0))
        .collect())
}
