//! Error types for hit-test configuration.

use thiserror::Error;

/// Errors raised while loading or validating hit-test configuration.
///
/// Queries themselves never fail: every degenerate input resolves to
/// "no hit".
#[derive(Error, Debug)]
pub enum HitTestError {
    /// A setting is out of range.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be parsed.
    #[error("failed to parse settings: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for hit-test configuration.
pub type Result<T> = std::result::Result<T, HitTestError>;
