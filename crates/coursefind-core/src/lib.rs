pub mod catalog;
pub mod config;
pub mod csv_source;
pub mod error;
pub mod filter;
pub mod memory;
pub mod normalizer;
pub mod traits;
pub mod types;
