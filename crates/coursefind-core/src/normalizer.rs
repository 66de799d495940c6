//! Record cleaning and the combined text fed to the embedding model.
//!
//! The order of the surviving records fixes the row id used by every
//! downstream artifact, so `normalize` never reorders.

use tracing::{debug, info};

use crate::types::CourseRecord;

/// Counts of what `normalize` kept and why it dropped the rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeReport {
    pub total: usize,
    pub kept: usize,
    /// Includes records whose description was empty as well.
    pub dropped_empty_title: usize,
    pub dropped_empty_description: usize,
}

impl NormalizeReport {
    pub fn dropped(&self) -> usize {
        self.dropped_empty_title + self.dropped_empty_description
    }
}

/// Trim title and description; drop records where either ends up empty.
pub fn normalize(records: Vec<CourseRecord>) -> (Vec<CourseRecord>, NormalizeReport) {
    info!("Cleaning course data...");
    let mut report = NormalizeReport { total: records.len(), ..NormalizeReport::default() };
    let mut kept = Vec::with_capacity(records.len());

    for (row, mut record) in records.into_iter().enumerate() {
        record.title = record.title.trim().to_string();
        record.description = record.description.trim().to_string();
        if record.title.is_empty() {
            debug!(row, "dropping record with empty title");
            report.dropped_empty_title += 1;
            continue;
        }
        if record.description.is_empty() {
            debug!(row, title = %record.title, "dropping record with empty description");
            report.dropped_empty_description += 1;
            continue;
        }
        kept.push(record);
    }

    report.kept = kept.len();
    info!(
        dropped_empty_title = report.dropped_empty_title,
        dropped_empty_description = report.dropped_empty_description,
        "Data cleaned. Remaining courses: {}",
        report.kept
    );
    (kept, report)
}

/// `title + " " + description + " " + curriculum`, with a missing curriculum
/// contributing an empty string.
pub fn combined_text(record: &CourseRecord) -> String {
    format!(
        "{} {} {}",
        record.title,
        record.description,
        record.curriculum.as_deref().unwrap_or("")
    )
}

pub fn combined_texts(records: &[CourseRecord]) -> Vec<String> {
    records.iter().map(combined_text).collect()
}
