//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `coursefind.toml` + `coursefind.<env>.toml` + `APP_*`
//! env vars (nested keys separated by `__`, e.g. `APP_EMBEDDING__BATCH_SIZE`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_MODEL: &str = "paraphrase-MiniLM-L6-v2";
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_TOP_K: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub input_csv_path: String,
    pub embeddings_path: String,
    pub index_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub batch_size: usize,
    pub max_len: usize,
    /// L2-normalize pooled vectors. Off for the paraphrase MiniLM family,
    /// which ships without a normalize layer.
    pub normalize: bool,
    /// Log process memory every N batches while embedding.
    pub memory_log_every: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub top_k: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            input_csv_path: "data/courses_data_final.csv".to_string(),
            embeddings_path: "vector_store/course_embeddings.npy".to_string(),
            index_path: "vector_store/course_index.bin".to_string(),
        }
    }
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_len: 256,
            normalize: false,
            memory_log_every: 10,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K }
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("coursefind.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("coursefind.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("coursefind.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("coursefind.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::Config(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::Config(format!("Failed to extract settings: {e}")))
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.embedding.batch_size == 0 {
            return Err(Error::Config("embedding.batch_size must be at least 1".into()));
        }
        if self.embedding.max_len == 0 {
            return Err(Error::Config("embedding.max_len must be at least 1".into()));
        }
        if self.search.top_k == 0 {
            return Err(Error::Config("search.top_k must be at least 1".into()));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(Error::Config("embedding.model must not be empty".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
