//! Data-quality report over the raw CSV and the embeddings artifact.

use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use coursefind_core::csv_source::{load_courses, DESCRIPTION_COLUMN, TITLE_COLUMN};
use coursefind_core::error::Result;
use coursefind_core::normalizer::normalize;
use coursefind_core::types::CourseRecord;
use coursefind_index::persist::load_embeddings;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingsCheck {
    pub rows: usize,
    pub dim: usize,
    /// Number of records the normalizer keeps; the matrix must have this many rows.
    pub expected_rows: usize,
}

impl EmbeddingsCheck {
    pub fn matches(&self) -> bool {
        self.rows == self.expected_rows
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataQualityReport {
    pub total_rows: usize,
    /// Missing (absent or blank) cells per column, in CSV column order.
    pub missing: Vec<(&'static str, usize)>,
    pub invalid_titles: usize,
    pub cleaned_rows: usize,
    pub embeddings: Option<EmbeddingsCheck>,
}

impl DataQualityReport {
    pub fn from_records(records: &[CourseRecord]) -> Self {
        let blank = |s: &str| s.trim().is_empty();
        let count = |f: fn(&CourseRecord) -> bool| records.iter().filter(|r| f(r)).count();
        let missing = vec![
            (TITLE_COLUMN, records.iter().filter(|r| blank(&r.title)).count()),
            (DESCRIPTION_COLUMN, records.iter().filter(|r| blank(&r.description)).count()),
            ("course_curriculum", count(|r| r.curriculum.is_none())),
            ("course_url", count(|r| r.url.is_none())),
            ("price", count(|r| r.price.is_none())),
            ("course_level", count(|r| r.level.is_none())),
            ("course_rating", count(|r| r.rating.is_none())),
            ("course_duration", count(|r| r.duration.is_none())),
            ("lesson_count", count(|r| r.lesson_count.is_none())),
            ("reviews", count(|r| r.reviews.is_none())),
            ("instructor_name", count(|r| r.instructor.is_none())),
            ("who_should_enroll", count(|r| r.who_should_enroll.is_none())),
        ];
        let invalid_titles = missing[0].1;
        let (kept, _) = normalize(records.to_vec());
        Self { total_rows: records.len(), missing, invalid_titles, cleaned_rows: kept.len(), embeddings: None }
    }

    pub fn is_consistent(&self) -> bool {
        self.embeddings.as_ref().map_or(true, EmbeddingsCheck::matches)
    }
}

/// Report on `csv_path` and, when given, check the embeddings artifact
/// against the number of records a build would keep.
pub fn check_data_quality(csv_path: &Path, embeddings_path: Option<&Path>) -> Result<DataQualityReport> {
    info!("Testing data quality...");
    let records = load_courses(csv_path)?;
    let mut report = DataQualityReport::from_records(&records);
    for (column, n) in report.missing.iter().filter(|(_, n)| *n > 0) {
        info!(column, missing = n, "missing values");
    }
    info!("Found {} invalid course titles.", report.invalid_titles);

    if let Some(path) = embeddings_path {
        let matrix = load_embeddings(path)?;
        let check = EmbeddingsCheck { rows: matrix.rows(), dim: matrix.dim(), expected_rows: report.cleaned_rows };
        if check.matches() {
            info!("Embeddings validated: {} embeddings match {} courses.", check.rows, check.expected_rows);
        } else {
            warn!(
                "Number of embeddings ({}) does not match number of courses ({}).",
                check.rows,
                check.expected_rows
            );
        }
        report.embeddings = Some(check);
    }
    Ok(report)
}
