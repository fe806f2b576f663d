//! Embedding service trait and the deterministic mock.
//!
//! Implementations convert text into fixed-dimensional vectors. Batching
//! exists purely for throughput: `embed_batch` must return exactly what
//! element-wise `embed` calls would.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tabletalk_core::error::TabletalkError;

/// Service for generating text embeddings.
pub trait EmbeddingService: Send + Sync {
    /// Generate an embedding vector for one text.
    fn embed(
        &self,
        text: &str,
    ) -> impl std::future::Future<Output = Result<Vec<f32>, TabletalkError>> + Send;

    /// Generate embeddings for a batch of texts, preserving input order.
    fn embed_batch(
        &self,
        texts: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<Vec<f32>>, TabletalkError>> + Send;

    /// Dimensionality of vectors produced by this service.
    fn dimensions(&self) -> usize;
}

/// Object-safe version of [`EmbeddingService`] for dynamic dispatch.
///
/// Because `EmbeddingService::embed` returns `impl Future` it is not
/// object-safe. This trait uses boxed futures instead, allowing
/// `Box<dyn DynEmbeddingService>` to be stored in structs without generics.
/// A blanket implementation covers every `EmbeddingService`.
pub trait DynEmbeddingService: Send + Sync {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, TabletalkError>> + Send + 'a>,
    >;

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>, TabletalkError>> + Send + 'a>,
    >;

    fn dimensions(&self) -> usize;
}

impl<T: EmbeddingService> DynEmbeddingService for T {
    fn embed_boxed<'a>(
        &'a self,
        text: &'a str,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<f32>, TabletalkError>> + Send + 'a>,
    > {
        Box::pin(self.embed(text))
    }

    fn embed_batch_boxed<'a>(
        &'a self,
        texts: &'a [String],
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Vec<Vec<f32>>, TabletalkError>> + Send + 'a>,
    > {
        Box::pin(self.embed_batch(texts))
    }

    fn dimensions(&self) -> usize {
        EmbeddingService::dimensions(self)
    }
}

// ---------------------------------------------------------------------------
// MockEmbedding - deterministic hash-based vectors for testing
// ---------------------------------------------------------------------------

/// Mock embedding service returning deterministic 384-dimensional unit
/// vectors derived from a hash of the input text. Identical inputs always
/// produce identical outputs, so deduplication and nearest-neighbor search
/// can be tested without a network call.
#[derive(Debug, Clone, Default)]
pub struct MockEmbedding;

impl MockEmbedding {
    pub fn new() -> Self {
        Self
    }

    fn hash_to_vector(text: &str) -> Vec<f32> {
        let mut result = Vec::with_capacity(384);
        for i in 0..384 {
            let mut hasher = DefaultHasher::new();
            text.hash(&mut hasher);
            i.hash(&mut hasher);
            let h = hasher.finish();
            let val = ((h as f64) / (u64::MAX as f64)) * 2.0 - 1.0;
            result.push(val as f32);
        }

        // L2-normalize so distances between unrelated texts stay bounded.
        let norm: f32 = result.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut result {
                *val /= norm;
            }
        }

        result
    }
}

impl EmbeddingService for MockEmbedding {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, TabletalkError> {
        if text.is_empty() {
            return Err(TabletalkError::Model("cannot embed empty text".to_string()));
        }
        Ok(Self::hash_to_vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, TabletalkError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        384
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_dimension() {
        let service = MockEmbedding::new();
        let vec = service.embed("hello world").await.unwrap();
        assert_eq!(vec.len(), 384);
    }

    #[tokio::test]
    async fn test_mock_embedding_deterministic() {
        let service = MockEmbedding::new();
        let v1 = service.embed("same text").await.unwrap();
        let v2 = service.embed("same text").await.unwrap();
        assert_eq!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_different_inputs() {
        let service = MockEmbedding::new();
        let v1 = service.embed("text one").await.unwrap();
        let v2 = service.embed("text two").await.unwrap();
        assert_ne!(v1, v2);
    }

    #[tokio::test]
    async fn test_mock_embedding_empty_text() {
        let service = MockEmbedding::new();
        assert!(service.embed("").await.is_err());
    }

    #[tokio::test]
    async fn test_batch_matches_single_calls() {
        let service = MockEmbedding::new();
        let texts: Vec<String> = vec!["alpha".into(), "beta".into(), "gamma".into()];
        let batch = service.embed_batch(&texts).await.unwrap();
        for (i, text) in texts.iter().enumerate() {
            let single = service.embed(text).await.unwrap();
            assert_eq!(batch[i], single);
        }
    }

    #[tokio::test]
    async fn test_mock_embedding_unit_norm() {
        let service = MockEmbedding::new();
        let vec = service.embed("normalize me").await.unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_dyn_embedding_via_box() {
        let boxed: Box<dyn DynEmbeddingService> = Box::new(MockEmbedding::new());
        let vec = boxed.embed_boxed("dynamic dispatch").await.unwrap();
        assert_eq!(vec.len(), boxed.dimensions());
    }
}
