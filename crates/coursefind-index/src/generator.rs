use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use coursefind_core::config::{EmbeddingSettings, DEFAULT_BATCH_SIZE};
use coursefind_core::error::{Error, Result};
use coursefind_core::memory::log_memory_usage;
use coursefind_core::traits::Embedder;

use crate::matrix::EmbeddingMatrix;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub batch_size: usize,
    /// Log memory every N batches; 0 disables the periodic log.
    pub memory_log_every: usize,
    pub show_progress: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self { batch_size: DEFAULT_BATCH_SIZE, memory_log_every: 10, show_progress: true }
    }
}

impl From<&EmbeddingSettings> for GeneratorOptions {
    fn from(s: &EmbeddingSettings) -> Self {
        Self { batch_size: s.batch_size, memory_log_every: s.memory_log_every, show_progress: true }
    }
}

/// Embed `texts` in consecutive batches of at most `batch_size`, one model
/// call per batch. Row `i` of the result is the embedding of `texts[i]`
/// whatever the batch size. The first failing batch aborts the run.
pub fn generate_embeddings(
    embedder: &dyn Embedder,
    texts: &[String],
    options: &GeneratorOptions,
) -> Result<EmbeddingMatrix> {
    if options.batch_size == 0 {
        return Err(Error::Config("batch size must be at least 1".into()));
    }
    info!(texts = texts.len(), batch_size = options.batch_size, "Generating embeddings...");
    log_memory_usage("embedding:start");

    let pb = if options.show_progress { ProgressBar::new(texts.len() as u64) } else { ProgressBar::hidden() };
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} texts ({percent}%) {msg}")
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);

    let mut matrix = EmbeddingMatrix::with_dim(embedder.dim());
    for (batch_no, batch) in texts.chunks(options.batch_size).enumerate() {
        let rows = embedder
            .embed_batch(batch)
            .map_err(|e| Error::model(format!("embedding batch {batch_no} failed: {e:#}")))?;
        if rows.len() != batch.len() {
            return Err(Error::integrity(format!(
                "batch {batch_no}: model returned {} rows for {} texts",
                rows.len(),
                batch.len()
            )));
        }
        for row in &rows {
            matrix.push_row(row)?;
        }
        pb.inc(batch.len() as u64);
        pb.set_message(format!("batch {}", batch_no + 1));
        if options.memory_log_every > 0 && (batch_no + 1) % options.memory_log_every == 0 {
            log_memory_usage("embedding");
        }
    }
    pb.finish_with_message("done");

    info!(rows = matrix.rows(), dim = matrix.dim(), "Generated embeddings for {} texts.", texts.len());
    log_memory_usage("embedding:end");
    Ok(matrix)
}
