//! Shared argument parsing and runners for the coursefind binaries.
//!
//! Each flag left unset falls back to the merged configuration
//! (`coursefind.toml`, `coursefind.<env>.toml`, `APP_*` variables).

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use coursefind_core::catalog::CourseCatalog;
use coursefind_core::config::{expand_path, Config, EmbeddingSettings, Settings};
use coursefind_core::csv_source::load_courses;
use coursefind_core::filter::{CourseFilter, Predicate, PriceKind};
use coursefind_core::normalizer::normalize;
use coursefind_core::traits::Embedder;
use coursefind_embed::get_default_embedder;
use coursefind_search::{check_data_quality, run_build, BuildOptions, DataQualityReport, QueryEngine};

/// Log to stderr; `RUST_LOG` overrides the default `info` filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

pub fn load_settings() -> Result<Settings> {
    let config = Config::load().context("Error loading config")?;
    Ok(config.settings()?)
}

/// Model selection shared by build and query. Querying an index needs the
/// same model and `max_len` it was built with.
#[derive(Args, Debug, Clone, Default)]
pub struct ModelArgs {
    /// Sentence-embedding model name or directory (default paraphrase-MiniLM-L6-v2)
    #[arg(long)]
    pub model: Option<String>,

    /// Token limit per text (default 256, capped by the model's own limit)
    #[arg(long)]
    pub max_len: Option<usize>,
}

impl ModelArgs {
    pub fn apply(&self, embedding: &mut EmbeddingSettings) {
        if let Some(m) = &self.model {
            embedding.model.clone_from(m);
        }
        if let Some(n) = self.max_len {
            embedding.max_len = n;
        }
    }
}

/// One-line summary of a loaded model for the run banner.
pub fn describe_embedder(embedder: &dyn Embedder) -> String {
    let max_len = match embedder.max_len() {
        usize::MAX => "unbounded".to_string(),
        n => format!("{n} tokens"),
    };
    format!("{} (dim {}, max_len {max_len})", embedder.model_id(), embedder.dim())
}

#[derive(Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Scraped course CSV [config: data.input_csv_path]
    #[arg(long)]
    pub input_csv_path: Option<PathBuf>,

    /// Output `.npy` embeddings matrix [config: data.embeddings_path]
    #[arg(long)]
    pub embeddings_path: Option<PathBuf>,

    /// Output index file [config: data.index_path]
    #[arg(long)]
    pub index_path: Option<PathBuf>,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Texts per model call (default 32)
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl BuildArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(p) = &self.input_csv_path {
            settings.data.input_csv_path = p.display().to_string();
        }
        if let Some(p) = &self.embeddings_path {
            settings.data.embeddings_path = p.display().to_string();
        }
        if let Some(p) = &self.index_path {
            settings.data.index_path = p.display().to_string();
        }
        self.model.apply(&mut settings.embedding);
        if let Some(b) = self.batch_size {
            settings.embedding.batch_size = b;
        }
    }
}

pub fn run_build_command(args: &BuildArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings);
    settings.validate()?;

    let mut options = BuildOptions::from_settings(&settings);
    options.generator.show_progress = !args.no_progress;

    println!("coursefind build\n================");
    println!("Input CSV: {}", options.input_csv_path.display());
    println!("Model: {}", settings.embedding.model);

    let embedder = get_default_embedder(&settings.embedding)
        .with_context(|| format!("failed to load embedding model '{}'", settings.embedding.model))?;
    println!("Loaded: {}", describe_embedder(embedder.as_ref()));
    let output = run_build(embedder.as_ref(), &options)?;

    println!("\n✅ Build completed successfully!");
    println!(
        "📊 {} courses kept, {} dropped (empty title: {}, empty description: {})",
        output.report.kept,
        output.report.dropped(),
        output.report.dropped_empty_title,
        output.report.dropped_empty_description
    );
    println!("📦 Embeddings {:?} → {}", output.matrix.shape(), options.embeddings_path.display());
    println!("📦 Index ({} entries) → {}", output.index.len(), options.index_path.display());
    Ok(())
}

#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Free-text query
    pub query: String,

    #[command(flatten)]
    pub model: ModelArgs,

    /// Index file [config: data.index_path]
    #[arg(long)]
    pub index_path: Option<PathBuf>,

    /// Embeddings matrix [config: data.embeddings_path]
    #[arg(long)]
    pub embeddings_path: Option<PathBuf>,

    /// Number of results (default 5) [config: search.top_k]
    #[arg(long, short = 'k')]
    pub top_k: Option<usize>,

    /// Course CSV used for the build; maps result ids back to courses
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Only free courses
    #[arg(long, conflicts_with = "paid")]
    pub free: bool,

    /// Only paid courses
    #[arg(long)]
    pub paid: bool,

    /// Level contains this text (case-insensitive)
    #[arg(long)]
    pub level: Option<String>,

    /// Minimum rating
    #[arg(long)]
    pub min_rating: Option<f32>,

    /// Minimum duration in minutes
    #[arg(long)]
    pub min_duration: Option<f32>,

    /// Title contains this text (case-insensitive)
    #[arg(long)]
    pub title: Option<String>,

    /// Print results as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

impl QueryArgs {
    pub fn filter(&self) -> CourseFilter {
        let mut filter = CourseFilter::new();
        if self.free {
            filter.push(Predicate::Price(PriceKind::Free));
        }
        if self.paid {
            filter.push(Predicate::Price(PriceKind::Paid));
        }
        if let Some(level) = &self.level {
            filter.push(Predicate::Level(level.clone()));
        }
        if let Some(r) = self.min_rating {
            filter.push(Predicate::MinRating(r));
        }
        if let Some(d) = self.min_duration {
            filter.push(Predicate::MinDuration(d));
        }
        if let Some(t) = &self.title {
            filter.push(Predicate::TitleContains(t.clone()));
        }
        filter
    }

    pub fn apply(&self, settings: &mut Settings) {
        if let Some(p) = &self.index_path {
            settings.data.index_path = p.display().to_string();
        }
        if let Some(p) = &self.embeddings_path {
            settings.data.embeddings_path = p.display().to_string();
        }
        if let Some(k) = self.top_k {
            settings.search.top_k = k;
        }
        self.model.apply(&mut settings.embedding);
    }
}

/// One printed search result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub rank: usize,
    pub id: usize,
    pub distance: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

/// Rebuild the catalog exactly as the build did: same CSV, same cleaning.
pub fn load_catalog(csv: &Path) -> Result<CourseCatalog> {
    let (records, _) = normalize(load_courses(csv)?);
    Ok(CourseCatalog::from_records(records))
}

/// Search and, when a catalog is given, attach course fields and apply
/// `filter` to the hits. With an active filter every entry is ranked first so
/// up to `k` matching courses can be returned.
pub fn search(
    engine: &QueryEngine,
    catalog: Option<&CourseCatalog>,
    filter: &CourseFilter,
    query: &str,
    k: usize,
) -> Result<Vec<ResultRow>> {
    let Some(catalog) = catalog else {
        if !filter.is_empty() {
            bail!("filters need --csv to look up course fields");
        }
        let hits = engine.query(query, k)?;
        return Ok(hits
            .iter()
            .enumerate()
            .map(|(i, h)| ResultRow {
                rank: i + 1,
                id: h.id,
                distance: h.distance,
                title: None,
                url: None,
                price: None,
                level: None,
                rating: None,
            })
            .collect());
    };

    catalog.check_rows(engine.len())?;
    let fetch = if filter.is_empty() { k } else { engine.len().max(1) };
    let hits = engine.query(query, fetch)?;
    let mut matched = filter.apply(catalog.resolve(&hits)?);
    matched.truncate(k);
    Ok(matched
        .into_iter()
        .enumerate()
        .map(|(i, (h, c))| ResultRow {
            rank: i + 1,
            id: h.id,
            distance: h.distance,
            title: Some(c.title.clone()),
            url: c.url.clone(),
            price: c.price.clone(),
            level: c.level.clone(),
            rating: c.rating,
        })
        .collect())
}

pub fn run_query_command(args: &QueryArgs, mut settings: Settings) -> Result<()> {
    args.apply(&mut settings);
    settings.validate()?;
    let k = settings.search.top_k;

    let embedder = get_default_embedder(&settings.embedding)
        .with_context(|| format!("failed to load embedding model '{}'", settings.embedding.model))?;
    tracing::info!("Query model: {}", describe_embedder(embedder.as_ref()));
    let engine = QueryEngine::open(
        embedder,
        &expand_path(&settings.data.index_path),
        &expand_path(&settings.data.embeddings_path),
    )?;
    let catalog = args.csv.as_deref().map(load_catalog).transpose()?;
    let rows = search(&engine, catalog.as_ref(), &args.filter(), &args.query, k)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    println!("🔍 Top {} similar courses to: \"{}\"", rows.len(), args.query);
    for row in &rows {
        match &row.title {
            Some(title) => println!("\n  {}. distance={:.4}  id={}  {}", row.rank, row.distance, row.id, title),
            None => println!("\n  {}. distance={:.4}  id={}", row.rank, row.distance, row.id),
        }
        let details: Vec<String> = [
            row.level.clone(),
            row.price.clone(),
            row.rating.map(|r| format!("rating {r:.1}")),
            row.url.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            println!("     {}", details.join(" | "));
        }
    }
    Ok(())
}

#[derive(Args, Debug, Clone, Default)]
pub struct CheckArgs {
    /// Course CSV [config: data.input_csv_path]
    #[arg(long)]
    pub input_csv_path: Option<PathBuf>,

    /// Embeddings matrix to check [config: data.embeddings_path]
    #[arg(long)]
    pub embeddings_path: Option<PathBuf>,

    /// Only check the CSV
    #[arg(long, default_value_t = false)]
    pub skip_embeddings: bool,

    /// Print the report as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

pub fn run_check_command(args: &CheckArgs, settings: &Settings) -> Result<DataQualityReport> {
    let csv = args.input_csv_path.clone().unwrap_or_else(|| expand_path(&settings.data.input_csv_path));
    let embeddings = (!args.skip_embeddings).then(|| {
        args.embeddings_path.clone().unwrap_or_else(|| expand_path(&settings.data.embeddings_path))
    });
    let report = check_data_quality(&csv, embeddings.as_deref())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Missing data in each column:");
        for (column, n) in &report.missing {
            println!("  {column:<22} {n}");
        }
        println!("Found {} invalid course titles.", report.invalid_titles);
        println!("{} of {} rows survive cleaning.", report.cleaned_rows, report.total_rows);
        if let Some(check) = &report.embeddings {
            println!("Embedding matrix: {} x {}", check.rows, check.dim);
        }
    }
    if !report.is_consistent() {
        bail!("embeddings artifact does not match the cleaned course count");
    }
    Ok(report)
}
