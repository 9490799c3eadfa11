//! Common error types for AIPM

use thiserror::Error;

/// Common result type for AIPM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the shared configuration and identifier layers
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
