//! Exact nearest-neighbor index over squared Euclidean distance.
//!
//! Every query scans every vector. No quantization or clustering, so results
//! are exact; that is affordable for catalogs of a few thousand courses.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::info;

use coursefind_core::error::{Error, Result};
use coursefind_core::types::{QueryHit, RowId};

use crate::matrix::EmbeddingMatrix;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    model_id: String,
    dim: usize,
    len: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// Bulk-load every row of `matrix`; entry ids are the row positions.
    pub fn build(matrix: &EmbeddingMatrix, model_id: impl Into<String>) -> Result<Self> {
        info!("Creating flat L2 index...");
        let index = Self {
            model_id: model_id.into(),
            dim: matrix.dim(),
            len: matrix.rows(),
            vectors: matrix.as_slice().to_vec(),
        };
        index.validate()?;
        info!(entries = index.len, dim = index.dim, "Flat index created successfully.");
        Ok(index)
    }

    /// Structural checks, run after build and after deserializing.
    pub fn validate(&self) -> Result<()> {
        if self.dim == 0 {
            return Err(Error::integrity("index dimension must be at least 1"));
        }
        if self.len.checked_mul(self.dim) != Some(self.vectors.len()) {
            return Err(Error::integrity(format!(
                "index declares {} x {} but stores {} values",
                self.len,
                self.dim,
                self.vectors.len()
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Identifier of the model whose vectors this index holds.
    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn vector(&self, id: RowId) -> Option<&[f32]> {
        (id < self.len).then(|| &self.vectors[id * self.dim..(id + 1) * self.dim])
    }

    pub(crate) fn raw_vectors(&self) -> &[f32] {
        &self.vectors
    }

    /// The `min(k, len)` nearest entries, ascending by distance; equal
    /// distances order by id.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<QueryHit>> {
        if query.len() != self.dim {
            return Err(Error::integrity(format!(
                "query has dimension {}, index has {}",
                query.len(),
                self.dim
            )));
        }
        let k = k.min(self.len);
        if k == 0 {
            return Ok(Vec::new());
        }

        let mut hits: Vec<QueryHit> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, v)| QueryHit { id, distance: squared_l2(query, v) })
            .collect();
        let by_distance = |a: &QueryHit, b: &QueryHit| -> Ordering {
            a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id))
        };
        if k < hits.len() {
            hits.select_nth_unstable_by(k - 1, by_distance);
            hits.truncate(k);
        }
        hits.sort_unstable_by(by_distance);
        Ok(hits)
    }
}

pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
