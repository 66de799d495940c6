use std::fs;
use std::path::Path;
use std::sync::Arc;

use coursefind_core::error::Error;
use coursefind_core::filter::{CourseFilter, Predicate, PriceKind};
use coursefind_core::normalizer::combined_text;
use coursefind_core::traits::Embedder;
use coursefind_core::types::CourseRecord;
use coursefind_embed::FakeEmbedder;
use coursefind_index::GeneratorOptions;
use coursefind_search::{
    build_in_memory, check_data_quality, run_build, BuildOptions, QueryEngine, QueryError,
};

const CSV: &str = "\
course_title,course_description,course_curriculum,price,course_level,course_rating
Python for Data Analysis,Learn pandas and numpy,Intro; DataFrames,Free,Beginner,4.6
Empty Description,   ,Nothing,Paid,Advanced,3.9
Rust Systems Programming,Ownership and borrowing in depth,,Paid,Intermediate,4.8
";

fn quiet() -> GeneratorOptions {
    GeneratorOptions { batch_size: 32, memory_log_every: 0, show_progress: false }
}

fn options(dir: &Path) -> BuildOptions {
    let input = dir.join("courses.csv");
    fs::write(&input, CSV).expect("write csv");
    BuildOptions {
        input_csv_path: input,
        embeddings_path: dir.join("vector_store/course_embeddings.npy"),
        index_path: dir.join("vector_store/course_index.bin"),
        generator: quiet(),
    }
}

fn fake() -> Arc<dyn Embedder> {
    Arc::new(FakeEmbedder::new(64))
}

#[test]
fn end_to_end_build_and_query() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path());
    let embedder = fake();

    let output = run_build(embedder.as_ref(), &opts).expect("build");
    assert_eq!(output.report.total, 3);
    assert_eq!(output.report.dropped_empty_description, 1);
    assert_eq!(output.catalog.len(), 2);
    assert_eq!(output.matrix.shape(), (2, 64));
    assert_eq!(output.index.len(), 2);
    assert!(opts.index_path.exists());
    assert!(opts.embeddings_path.exists());

    let engine = QueryEngine::open(embedder, &opts.index_path, &opts.embeddings_path).expect("open");
    let first = output.catalog.get(0).expect("first course");
    let hits = engine.query(&combined_text(first), 5).expect("query");
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, 0);
    assert!(hits[0].distance.abs() < 1e-5);

    let resolved = output.catalog.resolve(&hits).expect("resolve");
    assert_eq!(resolved[0].1.title, "Python for Data Analysis");
    assert_eq!(resolved[1].1.title, "Rust Systems Programming");
}

#[test]
fn rebuilding_gives_identical_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path());
    let embedder = fake();

    run_build(embedder.as_ref(), &opts).expect("first build");
    let npy = fs::read(&opts.embeddings_path).expect("npy");
    let index = fs::read(&opts.index_path).expect("index");

    run_build(embedder.as_ref(), &opts).expect("second build");
    assert_eq!(fs::read(&opts.embeddings_path).expect("npy"), npy);
    assert_eq!(fs::read(&opts.index_path).expect("index"), index);
}

#[test]
fn nothing_left_after_cleaning_is_an_input_error() {
    let records = vec![CourseRecord::new("  ", "desc"), CourseRecord::new("Title", "")];
    let err = build_in_memory(&FakeEmbedder::new(8), records, &quiet()).expect_err("empty");
    assert!(matches!(err, Error::Input(_)));
}

#[test]
fn missing_input_writes_no_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(dir.path());
    opts.input_csv_path = dir.path().join("missing.csv");
    let err = run_build(&FakeEmbedder::new(8), &opts).expect_err("missing csv");
    assert!(matches!(err, Error::Input(_)));
    assert!(!opts.index_path.exists());
    assert!(!opts.embeddings_path.exists());
}

#[test]
fn engine_rejects_bad_requests_and_stays_usable() {
    let embedder = fake();
    let records = vec![
        CourseRecord::new("A", "alpha"),
        CourseRecord::new("B", "beta"),
        CourseRecord::new("C", "gamma"),
    ];
    let output = build_in_memory(embedder.as_ref(), records, &quiet()).expect("build");
    let engine = QueryEngine::new(embedder, Arc::new(output.index)).expect("engine");

    assert_eq!(engine.query("   ", 3), Err(QueryError::EmptyQuery));
    assert_eq!(engine.query("alpha", 0), Err(QueryError::InvalidK));
    assert_eq!(engine.query("alpha", 100).expect("query").len(), 3);
    assert_eq!(engine.embedding(2).map(<[f32]>::len), Some(64));
}

#[test]
fn engine_rejects_index_from_another_model() {
    let records = vec![CourseRecord::new("A", "alpha")];
    let output = build_in_memory(&FakeEmbedder::new(16), records, &quiet()).expect("build");
    let other: Arc<dyn Embedder> = Arc::new(FakeEmbedder::new(32));
    let err = QueryEngine::new(other, Arc::new(output.index)).err().expect("mismatch");
    assert!(matches!(err, Error::Model(_)));
}

struct WrongDim;

impl Embedder for WrongDim {
    fn model_id(&self) -> &str {
        "fake-xxhash:d8"
    }
    fn dim(&self) -> usize {
        8
    }
    fn max_len(&self) -> usize {
        8
    }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.0; 3]).collect())
    }
}

#[test]
fn query_vector_of_wrong_width_is_rejected() {
    let records = vec![CourseRecord::new("A", "alpha")];
    let output = build_in_memory(&FakeEmbedder::new(8), records, &quiet()).expect("build");
    let engine = QueryEngine::new(Arc::new(WrongDim), Arc::new(output.index)).expect("engine");
    assert_eq!(engine.query("alpha", 1), Err(QueryError::DimensionMismatch { expected: 8, got: 3 }));
}

#[test]
fn engine_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<QueryEngine>();
}

#[test]
fn filters_apply_after_search() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path());
    let embedder = fake();
    let output = run_build(embedder.as_ref(), &opts).expect("build");
    let engine = QueryEngine::new(embedder, Arc::new(output.index.clone())).expect("engine");

    let hits = engine.query("programming", engine.len()).expect("query");
    let resolved = output.catalog.resolve(&hits).expect("resolve");
    let paid = CourseFilter::new().with(Predicate::Price(PriceKind::Paid));
    let kept = paid.apply(resolved.clone());
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].1.title, "Rust Systems Programming");

    let strict = CourseFilter::new()
        .with(Predicate::Price(PriceKind::Free))
        .with(Predicate::MinRating(4.7));
    assert!(strict.apply(resolved).is_empty());
}

#[test]
fn data_quality_report_counts_missing_and_checks_embeddings() {
    let dir = tempfile::tempdir().expect("tempdir");
    let opts = options(dir.path());
    run_build(&FakeEmbedder::new(8), &opts).expect("build");

    let report = check_data_quality(&opts.input_csv_path, Some(&opts.embeddings_path)).expect("check");
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.invalid_titles, 0);
    assert_eq!(report.cleaned_rows, 2);
    let missing: std::collections::HashMap<_, _> = report.missing.iter().copied().collect();
    assert_eq!(missing["course_description"], 1);
    assert_eq!(missing["course_curriculum"], 1);
    assert_eq!(missing["course_url"], 3);
    let check = report.embeddings.as_ref().expect("embeddings checked");
    assert_eq!((check.rows, check.dim), (2, 8));
    assert!(report.is_consistent());
}

/// Embeds like the fake model until it meets a Rust course.
struct FailsOnRust(FakeEmbedder);

impl Embedder for FailsOnRust {
    fn model_id(&self) -> &str {
        self.0.model_id()
    }
    fn dim(&self) -> usize {
        self.0.dim()
    }
    fn max_len(&self) -> usize {
        self.0.max_len()
    }
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.iter().any(|t| t.contains("Rust")) {
            anyhow::bail!("out of memory");
        }
        self.0.embed_batch(texts)
    }
}

#[test]
fn failed_later_batch_persists_nothing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(dir.path());
    opts.generator.batch_size = 1;

    let err = run_build(&FailsOnRust(FakeEmbedder::new(64)), &opts).expect_err("batch 1 fails");
    assert!(matches!(err, Error::Model(_)), "got {err:?}");
    assert!(!opts.index_path.exists());
    assert!(!opts.embeddings_path.exists());
    let leftovers = opts.index_path.parent().map_or(0, |p| fs::read_dir(p).map_or(0, Iterator::count));
    assert_eq!(leftovers, 0, "no temp files left behind");
}

#[test]
fn failed_rebuild_keeps_published_artifacts() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut opts = options(dir.path());
    run_build(&FakeEmbedder::new(64), &opts).expect("first build");
    let npy = fs::read(&opts.embeddings_path).expect("npy");
    let index = fs::read(&opts.index_path).expect("index");

    opts.generator.batch_size = 1;
    run_build(&FailsOnRust(FakeEmbedder::new(64)), &opts).expect_err("rebuild fails");

    assert_eq!(fs::read(&opts.embeddings_path).expect("npy"), npy);
    assert_eq!(fs::read(&opts.index_path).expect("index"), index);
    QueryEngine::open(fake(), &opts.index_path, &opts.embeddings_path).expect("previous pair still loads");
}
