//! One-shot build: CSV → cleaned records → embeddings → index → artifacts.

use std::path::PathBuf;

use tracing::info;

use coursefind_core::catalog::CourseCatalog;
use coursefind_core::config::{expand_path, Settings};
use coursefind_core::csv_source::load_courses;
use coursefind_core::error::{Error, Result};
use coursefind_core::memory::log_memory_usage;
use coursefind_core::normalizer::{combined_texts, normalize, NormalizeReport};
use coursefind_core::traits::Embedder;
use coursefind_core::types::CourseRecord;
use coursefind_index::{generate_embeddings, save_artifacts, EmbeddingMatrix, FlatIndex, GeneratorOptions};

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub input_csv_path: PathBuf,
    pub embeddings_path: PathBuf,
    pub index_path: PathBuf,
    pub generator: GeneratorOptions,
}

impl BuildOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            input_csv_path: expand_path(&settings.data.input_csv_path),
            embeddings_path: expand_path(&settings.data.embeddings_path),
            index_path: expand_path(&settings.data.index_path),
            generator: GeneratorOptions::from(&settings.embedding),
        }
    }
}

/// Everything a build produced. `catalog`, `matrix` and `index` are aligned
/// row for row.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub catalog: CourseCatalog,
    pub matrix: EmbeddingMatrix,
    pub index: FlatIndex,
    pub report: NormalizeReport,
}

/// Clean, embed and index `records` without touching the filesystem.
pub fn build_in_memory(
    embedder: &dyn Embedder,
    records: Vec<CourseRecord>,
    generator: &GeneratorOptions,
) -> Result<BuildOutput> {
    let (records, report) = normalize(records);
    if records.is_empty() {
        return Err(Error::input(format!(
            "no courses left after cleaning ({} read, {} dropped)",
            report.total,
            report.dropped()
        )));
    }

    let texts = combined_texts(&records);
    let matrix = generate_embeddings(embedder, &texts, generator)?;
    if matrix.rows() != records.len() {
        return Err(Error::integrity(format!(
            "{} embeddings for {} courses",
            matrix.rows(),
            records.len()
        )));
    }
    let index = FlatIndex::build(&matrix, embedder.model_id())?;

    Ok(BuildOutput { catalog: CourseCatalog::from_records(records), matrix, index, report })
}

/// Full build from the CSV on disk. Artifacts are only written after every
/// batch has been embedded and the index built.
pub fn run_build(embedder: &dyn Embedder, options: &BuildOptions) -> Result<BuildOutput> {
    log_memory_usage("build:start");
    let records = load_courses(&options.input_csv_path)?;
    let output = build_in_memory(embedder, records, &options.generator)?;

    save_artifacts(&options.index_path, &options.embeddings_path, &output.matrix, &output.index)?;
    info!(
        courses = output.catalog.len(),
        dim = output.matrix.dim(),
        model = embedder.model_id(),
        "Build complete: index at {}, embeddings at {}",
        options.index_path.display(),
        options.embeddings_path.display()
    );
    log_memory_usage("build:end");
    Ok(output)
}
