//! Build pipeline and query engine over the course index.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod validate;

pub use engine::QueryEngine;
pub use error::QueryError;
pub use pipeline::{build_in_memory, run_build, BuildOptions, BuildOutput};
pub use validate::{check_data_quality, DataQualityReport, EmbeddingsCheck};
