//! Flat vector index with brute-force Euclidean nearest-neighbor search.
//!
//! All operations are O(n) per query, which is acceptable for
//! dataset-per-deployment sizes. The index is write-once: built in full
//! during ingestion and then only read.

/// A flat, immutable index over fixed-dimension vectors.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimensions: usize,
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    /// Build an index over the given vectors. All vectors must share the
    /// same dimensionality.
    pub fn build(dimensions: usize, vectors: Vec<Vec<f32>>) -> Self {
        debug_assert!(vectors.iter().all(|v| v.len() == dimensions));
        Self {
            dimensions,
            vectors,
        }
    }

    /// Number of vectors in the index.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Find the `k` nearest vectors to `query` by Euclidean distance.
    ///
    /// Returns (position, distance) pairs ordered by ascending distance.
    /// The sort is stable, so ties fall back to insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(i, v)| (i, l2_distance(query, v)))
            .collect();

        scored.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        scored
    }
}

/// Euclidean distance between two vectors.
///
/// Length mismatches compare only the shared prefix; callers are expected
/// to keep dimensions consistent.
fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_returns_nearest_first() {
        let index = FlatIndex::build(
            2,
            vec![vec![10.0, 10.0], vec![1.0, 1.0], vec![5.0, 5.0]],
        );
        let hits = index.search(&[0.0, 0.0], 3);
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].0, 1);
        assert_eq!(hits[1].0, 2);
        assert_eq!(hits[2].0, 0);
    }

    #[test]
    fn test_search_respects_k() {
        let vectors = (0..10).map(|i| vec![i as f32]).collect();
        let index = FlatIndex::build(1, vectors);
        let hits = index.search(&[0.0], 3);
        assert_eq!(hits.len(), 3);
    }

    #[test]
    fn test_search_k_larger_than_index() {
        let index = FlatIndex::build(1, vec![vec![1.0]]);
        let hits = index.search(&[0.0], 10);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_search_empty_index() {
        let index = FlatIndex::build(4, Vec::new());
        assert!(index.search(&[0.0; 4], 5).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn test_exact_match_distance_zero() {
        let index = FlatIndex::build(3, vec![vec![1.0, 2.0, 3.0]]);
        let hits = index.search(&[1.0, 2.0, 3.0], 1);
        assert!(hits[0].1.abs() < 1e-6);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        // Two identical vectors: stable sort keeps the earlier one first.
        let index = FlatIndex::build(1, vec![vec![1.0], vec![1.0]]);
        let hits = index.search(&[0.0], 2);
        assert_eq!(hits[0].0, 0);
        assert_eq!(hits[1].0, 1);
    }

    #[test]
    fn test_l2_distance() {
        assert!((l2_distance(&[0.0, 0.0], &[3.0, 4.0]) - 5.0).abs() < 1e-6);
        assert_eq!(l2_distance(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_len_and_dimensions() {
        let index = FlatIndex::build(8, vec![vec![0.0; 8]; 4]);
        assert_eq!(index.len(), 4);
        assert_eq!(index.dimensions(), 8);
    }
}
