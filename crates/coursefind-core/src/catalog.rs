//! Row-id keyed lookup from index hits back to course metadata.
//!
//! The vector index stores only vectors and their positions. This table is
//! the caller-owned half of that contract: entry `i` is the record whose
//! combined text produced embedding row `i`.

use crate::error::{Error, Result};
use crate::types::{CourseRecord, QueryHit, RowId};

#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    records: Vec<CourseRecord>,
}

impl CourseCatalog {
    /// `records` must be the normalized records in the order they were embedded.
    pub fn from_records(records: Vec<CourseRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: RowId) -> Option<&CourseRecord> {
        self.records.get(id)
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    /// Pair every hit with its record. A hit outside the catalog means the
    /// catalog and the index were built from different inputs.
    pub fn resolve<'a>(&'a self, hits: &[QueryHit]) -> Result<Vec<(QueryHit, &'a CourseRecord)>> {
        hits.iter()
            .map(|hit| {
                self.get(hit.id).map(|record| (*hit, record)).ok_or_else(|| {
                    Error::integrity(format!(
                        "hit id {} outside catalog of {} courses",
                        hit.id,
                        self.len()
                    ))
                })
            })
            .collect()
    }

    /// Ensure the catalog covers exactly `rows` index entries.
    pub fn check_rows(&self, rows: usize) -> Result<()> {
        if self.len() == rows {
            Ok(())
        } else {
            Err(Error::integrity(format!(
                "catalog has {} courses but index has {} rows",
                self.len(),
                rows
            )))
        }
    }
}
