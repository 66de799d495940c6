//! Reads the scraped course CSV into [`CourseRecord`]s.
//!
//! The source corpus mixes UTF-8 with legacy Latin-1 bytes, so every cell is
//! decoded on its own: valid UTF-8 is taken as-is, anything else is decoded as
//! ISO-8859-1, which maps every byte to a char and therefore never fails.

use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::types::CourseRecord;

pub const TITLE_COLUMN: &str = "course_title";
pub const DESCRIPTION_COLUMN: &str = "course_description";
pub const CURRICULUM_COLUMN: &str = "course_curriculum";

/// Column positions resolved from the header row.
#[derive(Debug, Clone)]
struct Columns {
    title: usize,
    description: usize,
    curriculum: Option<usize>,
    url: Option<usize>,
    price: Option<usize>,
    level: Option<usize>,
    rating: Option<usize>,
    duration: Option<usize>,
    lesson_count: Option<usize>,
    reviews: Option<usize>,
    instructor: Option<usize>,
    who_should_enroll: Option<usize>,
}

impl Columns {
    fn locate(headers: &ByteRecord) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| decode_field(h).trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        let find = |name: &str| names.iter().position(|n| n == name);
        let required = |name: &str| {
            find(name).ok_or_else(|| Error::input(format!("CSV is missing required column '{name}'")))
        };
        Ok(Self {
            title: required(TITLE_COLUMN)?,
            description: required(DESCRIPTION_COLUMN)?,
            curriculum: find(CURRICULUM_COLUMN),
            url: find("course_url"),
            price: find("price"),
            level: find("course_level"),
            rating: find("course_rating"),
            duration: find("course_duration"),
            lesson_count: find("lesson_count"),
            reviews: find("reviews"),
            instructor: find("instructor_name"),
            who_should_enroll: find("who_should_enroll"),
        })
    }

    fn record(&self, row: &ByteRecord) -> CourseRecord {
        let text = |idx: Option<usize>| {
            idx.and_then(|i| row.get(i))
                .map(decode_field)
                .filter(|s| !s.trim().is_empty())
        };
        CourseRecord {
            title: text(Some(self.title)).unwrap_or_default(),
            description: text(Some(self.description)).unwrap_or_default(),
            curriculum: text(self.curriculum),
            url: text(self.url),
            price: text(self.price),
            level: text(self.level),
            rating: text(self.rating).and_then(|s| parse_number(&s)),
            duration: text(self.duration).and_then(|s| parse_number(&s)),
            lesson_count: text(self.lesson_count).and_then(|s| parse_count(&s)),
            reviews: text(self.reviews).and_then(|s| parse_count(&s)),
            instructor: text(self.instructor),
            who_should_enroll: text(self.who_should_enroll),
        }
    }
}

/// Load all rows of the course CSV at `path`, in file order.
pub fn load_courses(path: &Path) -> Result<Vec<CourseRecord>> {
    if !path.exists() {
        return Err(Error::input(format!("Input file does not exist at: {}", path.display())));
    }
    info!("Loading data from {}...", path.display());
    let file = File::open(path)
        .map_err(|e| Error::input(format!("Failed to open {}: {e}", path.display())))?;
    read_courses(file)
}

/// Parse course rows from any reader. Rows may be ragged; a cell that is
/// absent is treated as missing.
pub fn read_courses<R: Read>(reader: R) -> Result<Vec<CourseRecord>> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = rdr
        .byte_headers()
        .map_err(|e| Error::input(format!("Malformed CSV header: {e}")))?
        .clone();
    let columns = Columns::locate(&headers)?;

    let mut records = Vec::new();
    for row in rdr.byte_records() {
        let row = row.map_err(|e| Error::input(format!("Malformed CSV: {e}")))?;
        records.push(columns.record(&row));
    }
    debug!(rows = records.len(), "parsed course CSV");
    Ok(records)
}

/// UTF-8 when valid, ISO-8859-1 otherwise.
pub fn decode_field(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

fn parse_number(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

// pandas writes integer columns with gaps as floats ("12.0").
fn parse_count(s: &str) -> Option<u32> {
    let s = s.trim();
    s.parse::<u32>().ok().or_else(|| {
        s.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0 && *v <= f64::from(u32::MAX))
            .map(|v| v.round() as u32)
    })
}
