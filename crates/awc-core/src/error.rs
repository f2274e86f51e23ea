//! Error types for workflow input handling.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid tool '{name}': {reason}")]
    InvalidTool { name: String, reason: String },

    #[error("Invalid workflow definition: {0}")]
    InvalidWorkflow(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
