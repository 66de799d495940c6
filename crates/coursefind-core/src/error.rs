use thiserror::Error;

/// Build-time and load-time failures. Every variant is fatal to the
/// operation that raised it; nothing is persisted after one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input error: {0}")]
    Input(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Index integrity error: {0}")]
    IndexIntegrity(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn integrity(msg: impl Into<String>) -> Self {
        Self::IndexIntegrity(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
