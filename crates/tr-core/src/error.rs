//! Shared configuration error type.
//!
//! Sub-crates define their own error enums and wrap `CoreError` as one
//! variant where they validate configuration.

use thiserror::Error;

/// The top-level error type for `tr-core`.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Config(String),
}

/// Shorthand result type for `tr-core`.
pub type CoreResult<T> = Result<T, CoreError>;
