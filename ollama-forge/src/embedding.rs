//! Vector math for comparing embeddings returned by
//! [`OllamaClient::embed`](crate::OllamaClient::embed).

use std::cmp::Ordering;

use crate::{Error, Result};

/// Norms below this are treated as zero.
const EPSILON: f32 = 1e-10;

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity of two vectors, in `-1.0..=1.0`.
///
/// Returns `0.0` when either vector has zero length.
///
/// # Errors
///
/// [`Error::InvalidInput`] if either vector is empty or their dimensions differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.is_empty() || b.is_empty() {
        return Err(Error::InvalidInput("Cannot compare empty vectors".into()));
    }
    if a.len() != b.len() {
        return Err(Error::InvalidInput(format!(
            "Dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }

    let (norm_a, norm_b) = (norm(a), norm(b));
    if norm_a < EPSILON || norm_b < EPSILON {
        return Ok(0.0);
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    Ok((dot / (norm_a * norm_b)).clamp(-1.0, 1.0))
}

/// Scales `vector` to unit length. A zero vector is returned unchanged.
pub fn normalize(vector: &[f32]) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(Error::InvalidInput("Cannot normalize an empty vector".into()));
    }

    let length = norm(vector);
    if length < EPSILON {
        #[cfg(feature = "tracing")]
        tracing::warn!("normalizing a zero vector; returning it unchanged");
        return Ok(vector.to_vec());
    }

    Ok(vector.iter().map(|x| x / length).collect())
}

/// Similarity of `query` against every row, paired with the row index.
///
/// Rows that cannot be compared (empty or of another dimension) score `0.0`.
pub fn batch_similarities(query: &[f32], rows: &[Vec<f32>]) -> Vec<(usize, f32)> {
    rows.iter()
        .enumerate()
        .map(|(index, row)| (index, cosine_similarity(query, row).unwrap_or(0.0)))
        .collect()
}

/// The `k` rows most similar to `query`, most similar first.
pub fn top_k(query: &[f32], rows: &[Vec<f32>], k: usize) -> Vec<(usize, f32)> {
    if k == 0 || rows.is_empty() {
        return Vec::new();
    }

    let mut scored = batch_similarities(query, rows);
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k.min(rows.len()));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn identical_vectors_are_fully_similar() {
        let v = [0.3, 0.4, 0.5];
        assert!(approx(cosine_similarity(&v, &v).unwrap(), 1.0));
    }

    #[test]
    fn orthogonal_and_opposite_vectors() {
        assert!(approx(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).unwrap(), 0.0));
        assert!(approx(cosine_similarity(&[1.0, 2.0], &[-1.0, -2.0]).unwrap(), -1.0));
    }

    #[test]
    fn zero_vector_scores_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).unwrap(), 0.0);
    }

    #[test]
    fn empty_or_mismatched_inputs_are_rejected() {
        assert!(matches!(
            cosine_similarity(&[], &[1.0]),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            cosine_similarity(&[1.0, 2.0], &[1.0]),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn normalize_yields_unit_length() {
        let n = normalize(&[3.0, 4.0]).unwrap();
        assert!(approx(n[0], 0.6));
        assert!(approx(n[1], 0.8));
        assert!(approx(norm(&n), 1.0));
    }

    #[test]
    fn normalize_leaves_zero_vector_alone() {
        assert_eq!(normalize(&[0.0, 0.0]).unwrap(), vec![0.0, 0.0]);
        assert!(normalize(&[]).is_err());
    }

    #[test]
    fn batch_scores_mismatched_rows_as_zero() {
        let rows = vec![vec![1.0, 0.0], vec![1.0, 0.0, 0.0], vec![]];
        let scores = batch_similarities(&[1.0, 0.0], &rows);
        assert_eq!(scores.len(), 3);
        assert!(approx(scores[0].1, 1.0));
        assert_eq!(scores[1], (1, 0.0));
        assert_eq!(scores[2], (2, 0.0));
    }

    #[test]
    fn top_k_sorts_and_clamps() {
        let rows = vec![vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
        let best = top_k(&[1.0, 0.1], &rows, 10);
        let order: Vec<usize> = best.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);

        assert_eq!(top_k(&[1.0, 0.1], &rows, 1).len(), 1);
        assert!(top_k(&[1.0, 0.1], &rows, 0).is_empty());
        assert!(top_k(&[1.0, 0.1], &[], 3).is_empty());
    }
}
