//! Error types for the featbal-core crate.

use thiserror::Error;

/// Malformed audit input. Raised before any check runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("empty vector: at least one feature importance is required")]
    EmptyVector,

    #[error("length mismatch: {names} names but {values} values")]
    LengthMismatch { names: usize, values: usize },

    #[error("non-finite importance at index {index} ({name})")]
    NonFinite { index: usize, name: String },

    #[error("importance of {name} is {value}, outside [0, 1]")]
    OutOfRange { name: String, value: f64 },

    #[error("importances sum to {sum}, more than {tolerance} away from 1.0")]
    SumOutOfTolerance { sum: f64, tolerance: f64 },
}

/// Top-level error type for audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Importance source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("Configuration load error: {0}")]
    Figment(#[from] Box<figment::Error>),
}

impl AuditError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Returns the underlying data error, if this is one.
    pub fn as_data(&self) -> Option<&DataError> {
        match self {
            Self::Data(e) => Some(e),
            _ => None,
        }
    }
}
