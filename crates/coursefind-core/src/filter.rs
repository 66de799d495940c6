//! Course filters as a flat list of independent predicates.
//!
//! A course passes a [`CourseFilter`] when it passes every active predicate;
//! an empty filter passes everything.

use crate::types::CourseRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceKind {
    Free,
    Paid,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Price(PriceKind),
    /// Case-insensitive substring match on the level column.
    Level(String),
    MinRating(f32),
    /// Minutes.
    MinDuration(f32),
    /// Case-insensitive substring match on the title.
    TitleContains(String),
}

impl Predicate {
    pub fn matches(&self, course: &CourseRecord) -> bool {
        match self {
            Predicate::Price(PriceKind::Free) => course.is_free(),
            Predicate::Price(PriceKind::Paid) => !course.is_free(),
            Predicate::Level(level) => course
                .level
                .as_deref()
                .is_some_and(|l| l.to_lowercase().contains(&level.to_lowercase())),
            Predicate::MinRating(min) => course.rating.is_some_and(|r| r >= *min),
            Predicate::MinDuration(min) => course.duration.is_some_and(|d| d >= *min),
            Predicate::TitleContains(needle) => {
                course.title.to_lowercase().contains(&needle.to_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseFilter {
    predicates: Vec<Predicate>,
}

impl CourseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn matches(&self, course: &CourseRecord) -> bool {
        self.predicates.iter().all(|p| p.matches(course))
    }

    /// Keep the items whose course passes, preserving order.
    pub fn apply<'a, T>(&self, items: impl IntoIterator<Item = (T, &'a CourseRecord)>) -> Vec<(T, &'a CourseRecord)> {
        items.into_iter().filter(|(_, course)| self.matches(course)).collect()
    }
}
