//! The vector knowledge store.
//!
//! Process-wide singleton state: one mutable slot holding an immutable
//! (documents, index) generation. Ingestion builds a complete replacement
//! generation and swaps it in atomically; readers clone the `Arc` once and
//! work against that snapshot, so an in-flight query sees either the
//! fully-old or fully-new generation, never a mix.

use std::sync::{Arc, RwLock};

use tracing::info;

use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_ingest::Dataset;
use tabletalk_model::EmbeddingService;

use crate::document::render_all;
use crate::index::FlatIndex;

/// Separator between documents in the retrieved context blob.
const CONTEXT_SEPARATOR: &str = "\n- ";

/// One immutable generation of the knowledge base.
///
/// Invariant: `documents.len() == index.len()`, position `i` in the index
/// corresponds to `documents[i]`.
#[derive(Debug)]
struct Generation {
    documents: Vec<String>,
    index: FlatIndex,
}

/// Dense-retrieval knowledge store over per-row documents.
pub struct VectorStore<E: EmbeddingService> {
    embedder: E,
    batch_size: usize,
    generation: RwLock<Option<Arc<Generation>>>,
}

impl<E: EmbeddingService> VectorStore<E> {
    /// Create an uninitialized store.
    ///
    /// `batch_size` bounds each embedding call; it affects throughput only,
    /// never results.
    pub fn new(embedder: E, batch_size: usize) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            generation: RwLock::new(None),
        }
    }

    /// Build a fresh generation from the dataset and swap it in.
    ///
    /// Fails with `IndexBuild` when the dataset produces zero documents; the
    /// store keeps whatever generation it had (including none). Callers are
    /// expected to serialize builds.
    pub async fn build(&self, dataset: &Dataset) -> Result<()> {
        let documents = render_all(dataset);
        if documents.is_empty() {
            return Err(TabletalkError::IndexBuild(format!(
                "dataset '{}' produced no documents",
                dataset.name
            )));
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(documents.len());
        for batch in documents.chunks(self.batch_size) {
            let embedded = self.embedder.embed_batch(batch).await?;
            vectors.extend(embedded);
        }

        if vectors.len() != documents.len() {
            return Err(TabletalkError::IndexBuild(format!(
                "embedded {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }

        let index = FlatIndex::build(self.embedder.dimensions(), vectors);
        let generation = Arc::new(Generation {
            documents,
            index,
        });

        let count = generation.documents.len();
        {
            let mut slot = self
                .generation
                .write()
                .map_err(|e| TabletalkError::IndexBuild(format!("lock poisoned: {}", e)))?;
            *slot = Some(generation);
        }

        info!(dataset = %dataset.name, documents = count, "Vector index built");
        Ok(())
    }

    /// Retrieve a deduplicated context blob for the query.
    ///
    /// `top_k` is search breadth, not a result-count guarantee: exact
    /// duplicates collapse to one entry, so fewer documents may come back.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<String> {
        let generation = self.snapshot()?.ok_or_else(|| {
            TabletalkError::NotInitialized("no dataset has been ingested yet".to_string())
        })?;

        let query_vector = self.embedder.embed(query).await?;
        let hits = generation.index.search(&query_vector, top_k);

        // Near-duplicate rows are common; keep the first occurrence only,
        // preserving rank order.
        let mut seen = std::collections::HashSet::new();
        let unique: Vec<&str> = hits
            .iter()
            .map(|(pos, _)| generation.documents[*pos].as_str())
            .filter(|doc| seen.insert(*doc))
            .collect();

        Ok(unique.join(CONTEXT_SEPARATOR))
    }

    /// True once a generation has been successfully built.
    pub fn is_initialized(&self) -> bool {
        self.snapshot().map(|g| g.is_some()).unwrap_or(false)
    }

    /// Documents in the current generation. Zero when uninitialized, which
    /// is distinct from the (unreachable-by-build) initialized-but-empty
    /// state.
    pub fn document_count(&self) -> usize {
        self.snapshot()
            .ok()
            .flatten()
            .map(|g| g.documents.len())
            .unwrap_or(0)
    }

    fn snapshot(&self) -> Result<Option<Arc<Generation>>> {
        self.generation
            .read()
            .map(|slot| slot.clone())
            .map_err(|e| TabletalkError::Storage(format!("lock poisoned: {}", e)))
    }
}

impl<E: EmbeddingService> std::fmt::Debug for VectorStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("batch_size", &self.batch_size)
            .field("documents", &self.document_count())
            .finish()
    }
}
