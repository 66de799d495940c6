use std::fs;

use coursefind_core::catalog::CourseCatalog;
use coursefind_core::config::Config;
use coursefind_core::csv_source::{load_courses, read_courses};
use coursefind_core::error::Error;
use coursefind_core::filter::{CourseFilter, PriceKind, Predicate};
use coursefind_core::normalizer::{combined_text, normalize};
use coursefind_core::types::{CourseRecord, QueryHit};
use tempfile::TempDir;

#[test]
fn normalize_drops_blank_title_and_whitespace_description() {
    let records = vec![
        CourseRecord::new("  Python Basics ", " Learn Python.  "),
        CourseRecord::new("   ", "Has a description"),
        CourseRecord::new("Has a title", " \t "),
        CourseRecord::new("SQL", "Queries"),
    ];

    let (kept, report) = normalize(records);

    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].title, "Python Basics", "title is trimmed");
    assert_eq!(kept[0].description, "Learn Python.", "description is trimmed");
    assert_eq!(kept[1].title, "SQL", "relative order is preserved");
    assert_eq!(report.total, 4);
    assert_eq!(report.kept, 2);
    assert_eq!(report.dropped_empty_title, 1);
    assert_eq!(report.dropped_empty_description, 1);
    assert_eq!(report.dropped(), 2);
}

#[test]
fn combined_text_joins_fields_with_optional_curriculum() {
    let with = CourseRecord::new("A", "B").with_curriculum("C");
    let without = CourseRecord::new("A", "B");
    assert_eq!(combined_text(&with), "A B C");
    assert_eq!(combined_text(&without), "A B ");
}

#[test]
fn csv_reads_latin1_and_optional_columns() {
    let mut bytes = b"course_title,course_description,course_curriculum,price,course_rating\n".to_vec();
    bytes.extend_from_slice(b"Caf\xe9 Analytics,Numbers,Intro;Pivot,Free,4.5\n");
    bytes.extend_from_slice(b"Deep Learning,Neural nets,,\"1,999\",\n");

    let records = read_courses(bytes.as_slice()).expect("read");

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].title, "Café Analytics");
    assert_eq!(records[0].curriculum.as_deref(), Some("Intro;Pivot"));
    assert!(records[0].is_free());
    assert_eq!(records[0].rating, Some(4.5));
    assert_eq!(records[1].curriculum, None, "empty cell is missing");
    assert_eq!(records[1].rating, None);
    assert!(!records[1].is_free());
}

#[test]
fn csv_tolerates_ragged_rows() {
    let csv = "course_title,course_description,course_curriculum\nOnly title\nBoth,Here\n";
    let records = read_courses(csv.as_bytes()).expect("read");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].description, "");
    let (kept, report) = normalize(records);
    assert_eq!(kept.len(), 1);
    assert_eq!(report.dropped_empty_description, 1);
}

#[test]
fn csv_missing_required_column_is_input_error() {
    let csv = "course_title,price\nPython,Free\n";
    let err = read_courses(csv.as_bytes()).expect_err("missing column");
    assert!(matches!(err, Error::Input(ref m) if m.contains("course_description")));
}

#[test]
fn load_courses_missing_file_is_input_error() {
    let tmp = TempDir::new().expect("tmp");
    let err = load_courses(&tmp.path().join("nope.csv")).expect_err("missing file");
    assert!(matches!(err, Error::Input(_)));
}

#[test]
fn load_courses_from_disk() {
    let tmp = TempDir::new().expect("tmp");
    let path = tmp.path().join("courses.csv");
    fs::write(&path, "\u{feff}course_title,course_description\nRust,Ownership\n").expect("write");
    let records = load_courses(&path).expect("load");
    assert_eq!(records, vec![CourseRecord::new("Rust", "Ownership")]);
}

#[test]
fn catalog_resolves_hits_by_row() {
    let catalog = CourseCatalog::from_records(vec![
        CourseRecord::new("zero", "d"),
        CourseRecord::new("one", "d"),
    ]);
    let hits = [QueryHit { id: 1, distance: 0.0 }, QueryHit { id: 0, distance: 0.5 }];
    let resolved = catalog.resolve(&hits).expect("resolve");
    assert_eq!(resolved[0].1.title, "one");
    assert_eq!(resolved[1].1.title, "zero");

    let bad = [QueryHit { id: 2, distance: 0.0 }];
    assert!(matches!(catalog.resolve(&bad), Err(Error::IndexIntegrity(_))));
    assert!(catalog.check_rows(2).is_ok());
    assert!(catalog.check_rows(3).is_err());
}

#[test]
fn filter_composes_independent_predicates() {
    let mut free_beginner = CourseRecord::new("Intro to Python", "d");
    free_beginner.price = Some("Free".into());
    free_beginner.level = Some("Beginner".into());
    free_beginner.duration = Some(90.0);
    free_beginner.rating = Some(4.0);

    let mut paid_advanced = CourseRecord::new("Advanced NLP", "d");
    paid_advanced.price = Some("$49".into());
    paid_advanced.level = Some("Advanced".into());
    paid_advanced.duration = Some(600.0);

    assert!(CourseFilter::new().matches(&paid_advanced), "empty filter passes all");

    let filter = CourseFilter::new()
        .with(Predicate::Price(PriceKind::Free))
        .with(Predicate::Level("beginner".into()))
        .with(Predicate::MinDuration(60.0));
    assert!(filter.matches(&free_beginner));
    assert!(!filter.matches(&paid_advanced));

    let rated = CourseFilter::new().with(Predicate::MinRating(3.5));
    assert!(rated.matches(&free_beginner));
    assert!(!rated.matches(&paid_advanced), "missing rating never passes a rating floor");

    let paid_long = CourseFilter::new()
        .with(Predicate::Price(PriceKind::Paid))
        .with(Predicate::MinDuration(300.0))
        .with(Predicate::TitleContains("nlp".into()));
    let items = vec![(0usize, &free_beginner), (1usize, &paid_advanced)];
    let kept = paid_long.apply(items);
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].0, 1);
}

#[test]
fn config_merges_toml_and_env() {
    figment::Jail::expect_with(|jail| {
        jail.create_file(
            "coursefind.toml",
            r#"
            [data]
            input_csv_path = "raw/courses.csv"

            [embedding]
            batch_size = 16
            "#,
        )?;
        jail.set_env("APP_SEARCH__TOP_K", "7");

        let config = Config::load().map_err(|e| e.to_string())?;
        let settings = config.settings().map_err(|e| e.to_string())?;
        assert_eq!(settings.data.input_csv_path, "raw/courses.csv");
        assert_eq!(settings.embedding.batch_size, 16);
        assert_eq!(settings.search.top_k, 7);
        assert_eq!(settings.embedding.model, "paraphrase-MiniLM-L6-v2", "unset keys keep defaults");
        let batch: usize = config.get("embedding.batch_size").map_err(|e| e.to_string())?;
        assert_eq!(batch, 16);
        Ok(())
    });
}

#[test]
fn config_rejects_zero_top_k() {
    figment::Jail::expect_with(|jail| {
        jail.create_file("coursefind.toml", "[search]\ntop_k = 0\n")?;
        assert!(matches!(Config::load(), Err(Error::Config(_))));
        Ok(())
    });
}
