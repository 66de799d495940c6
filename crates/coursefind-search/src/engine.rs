use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info};

use coursefind_core::error::{Error, Result};
use coursefind_core::traits::Embedder;
use coursefind_core::types::{QueryHit, RowId};
use coursefind_index::{load_artifacts, FlatIndex};

use crate::error::QueryError;

/// Read-only semantic search over a built course index.
///
/// Holds the embedding model and the index behind `Arc`s and never mutates
/// either, so one engine can serve concurrent callers.
#[derive(Clone)]
pub struct QueryEngine {
    embedder: Arc<dyn Embedder>,
    index: Arc<FlatIndex>,
}

impl QueryEngine {
    /// Fails when the index was built by a different model than `embedder`.
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<FlatIndex>) -> Result<Self> {
        if embedder.model_id() != index.model_id() {
            return Err(Error::model(format!(
                "index was built with model '{}' but the engine was given '{}'",
                index.model_id(),
                embedder.model_id()
            )));
        }
        if embedder.dim() != index.dim() {
            return Err(Error::model(format!(
                "model produces {}-dimensional vectors, index holds {}",
                embedder.dim(),
                index.dim()
            )));
        }
        Ok(Self { embedder, index })
    }

    /// Load both artifacts, verify they agree, and wrap them in an engine.
    pub fn open(embedder: Arc<dyn Embedder>, index_path: &Path, embeddings_path: &Path) -> Result<Self> {
        info!("Loading index and embeddings...");
        let (index, _matrix) = load_artifacts(index_path, embeddings_path)?;
        Self::new(embedder, Arc::new(index))
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &FlatIndex {
        &self.index
    }

    /// Stored vector for `id`, as written by the build.
    pub fn embedding(&self, id: RowId) -> Option<&[f32]> {
        self.index.vector(id)
    }

    /// Embed `text` with the build model and return the `min(k, len)`
    /// nearest courses, closest first.
    pub fn query(&self, text: &str, k: usize) -> std::result::Result<Vec<QueryHit>, QueryError> {
        if text.trim().is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        if k == 0 {
            return Err(QueryError::InvalidK);
        }

        let vector = self
            .embedder
            .embed_batch(&[text.to_string()])
            .map_err(|e| QueryError::Embedding(format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or_else(|| QueryError::Embedding("model returned no vector".into()))?;
        let expected = self.index.dim();
        if vector.len() != expected {
            return Err(QueryError::DimensionMismatch { expected, got: vector.len() });
        }

        let hits = self
            .index
            .search(&vector, k)
            .map_err(|_| QueryError::DimensionMismatch { expected, got: vector.len() })?;
        debug!(k, returned = hits.len(), "query answered");
        Ok(hits)
    }
}
