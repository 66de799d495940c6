use serde::{Deserialize, Serialize};

use coursefind_core::error::{Error, Result};

/// Row-major `rows x dim` f32 matrix, one row per cleaned course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl EmbeddingMatrix {
    /// Empty matrix that will only accept rows of width `dim`.
    pub fn with_dim(dim: usize) -> Self {
        Self { rows: 0, dim, data: Vec::new() }
    }

    pub fn from_flat(rows: usize, dim: usize, data: Vec<f32>) -> Result<Self> {
        let expected = rows
            .checked_mul(dim)
            .ok_or_else(|| Error::integrity(format!("shape ({rows}, {dim}) overflows")))?;
        if data.len() != expected {
            return Err(Error::integrity(format!(
                "shape ({rows}, {dim}) needs {expected} values, got {}",
                data.len()
            )));
        }
        Ok(Self { rows, dim, data })
    }

    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self> {
        let dim = rows.first().map_or(0, Vec::len);
        let mut matrix = Self::with_dim(dim);
        for row in &rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append one row. A row of the wrong width is never truncated or padded.
    pub fn push_row(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dim {
            return Err(Error::integrity(format!(
                "row {} has dimension {}, expected {}",
                self.rows,
                row.len(),
                self.dim
            )));
        }
        self.data.extend_from_slice(row);
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.dim)
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn row(&self, i: usize) -> Option<&[f32]> {
        if i >= self.rows {
            return None;
        }
        let start = i * self.dim;
        Some(&self.data[start..start + self.dim])
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = &[f32]> {
        (0..self.rows).filter_map(move |i| self.row(i))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}
