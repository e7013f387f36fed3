//! Error types for askbench.

use thiserror::Error;

/// The main error type for all askbench operations.
///
/// Each request fails independently: none of these variants are fatal to the
/// process, and none are retried automatically.
#[derive(Error, Debug)]
pub enum AskbenchError {
    /// Disallowed SQL shape (unknown table/column, multiple statements, DDL,
    /// placeholder/parameter mismatch, unparseable SQL)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database-level failure
    #[error("Execution error: {0}")]
    Execution(String),

    /// External model failure or refusal
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration or CLI input errors
    #[error("Config error: {0}")]
    Config(String),
}

impl AskbenchError {
    /// Creates a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Creates an execution error.
    pub fn execution(msg: impl Into<String>) -> Self {
        Self::Execution(msg.into())
    }

    /// Creates a generation error.
    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    /// Creates a config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns the error category as a string (for logging and the web API).
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Execution(_) => "execution",
            Self::Generation(_) => "generation",
            Self::Config(_) => "config",
        }
    }
}

/// Result type alias using AskbenchError.
pub type Result<T> = std::result::Result<T, AskbenchError>;
