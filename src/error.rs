//! Error types for the market verdict engine

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {

    // =============================
    // Decision Engine Errors
    // =============================

    #[error("Architecture error: {0}")]
    ArchitectureError(String),

    #[error("Contract violation by agent {agent}: {field} = {value} is out of range")]
    ContractViolation {
        agent: String,
        field: &'static str,
        value: f64,
    },

    #[error("Incomplete execution: collected {collected} of {expected} agent results")]
    IncompleteExecution { expected: usize, collected: usize },

    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // Collaborator Errors
    // =============================

    #[error("Market data error: {0}")]
    DataError(String),

    #[error("Verdict store error: {0}")]
    StoreError(String),

    #[error("Invalid verdict: {0}")]
    InvalidVerdict(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
