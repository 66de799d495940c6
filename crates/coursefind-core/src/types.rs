//! Domain types shared by the normalizer, the index and the query engine.

use serde::{Deserialize, Serialize};

/// Row position of a course in the cleaned record order. It is also the
/// internal id of the matching embedding row and index entry.
pub type RowId = usize;

/// One course as read from the scraped CSV.
///
/// Only `title` and `description` are required; the normalizer drops records
/// where either is empty after trimming. Everything else is carried along for
/// display and filtering and never reaches the vector index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub title: String,
    pub description: String,
    pub curriculum: Option<String>,
    pub url: Option<String>,
    pub price: Option<String>,
    pub level: Option<String>,
    pub rating: Option<f32>,
    /// Minutes.
    pub duration: Option<f32>,
    pub lesson_count: Option<u32>,
    pub reviews: Option<u32>,
    pub instructor: Option<String>,
    pub who_should_enroll: Option<String>,
}

impl CourseRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), ..Self::default() }
    }

    pub fn with_curriculum(mut self, curriculum: impl Into<String>) -> Self {
        self.curriculum = Some(curriculum.into());
        self
    }

    pub fn is_free(&self) -> bool {
        self.price.as_deref().map(str::trim) == Some("Free")
    }
}

/// A single nearest-neighbor hit.
///
/// `distance` is the squared Euclidean distance between the query vector and
/// the indexed vector; lower is closer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QueryHit {
    pub id: RowId,
    pub distance: f32,
}
