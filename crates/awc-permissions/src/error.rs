//! Error types for permission compilation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PermissionError {
    /// Engine-native input reached a stage that only accepts neutral tools.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, PermissionError>;
