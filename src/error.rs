//! gql-jit error types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, JitError>;

#[derive(Error, Debug)]
pub enum JitError {
    #[error("No compiled artifact cached for key: {0}")]
    CacheEntryNotFound(String),

    #[error("Compilation failed: {0}")]
    CompilationFailed(#[source] anyhow::Error),

    #[error("Subscription setup failed: {0}")]
    SubscriptionSetup(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Generic error: {0}")]
    GenericError(#[from] anyhow::Error),
}
