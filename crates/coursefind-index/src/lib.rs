//! Embedding matrix, batched generation, exact L2 index and their on-disk
//! artifacts.
//!
//! Row `i` of the [`EmbeddingMatrix`], entry `i` of the [`FlatIndex`] and
//! record `i` of the cleaned course list always describe the same course.

pub mod flat;
pub mod generator;
pub mod matrix;
pub mod npy;
pub mod persist;

pub use flat::FlatIndex;
pub use generator::{generate_embeddings, GeneratorOptions};
pub use matrix::EmbeddingMatrix;
pub use persist::{load_artifacts, save_artifacts};
