//! Errors surfaced by a workflow compilation.

use thiserror::Error;

/// The first failure of any stage aborts the whole compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Workflow(#[from] awc_core::Error),

    #[error("Permission compilation failed: {0}")]
    Permission(#[from] awc_permissions::PermissionError),

    #[error("Job graph error: {0}")]
    Graph(#[from] awc_graph::GraphError),

    #[error("Invalid trigger: {0}")]
    InvalidTrigger(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, CompileError>;

impl From<serde_json::Error> for CompileError {
    fn from(err: serde_json::Error) -> Self {
        CompileError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for CompileError {
    fn from(err: serde_yaml::Error) -> Self {
        CompileError::Serialization(err.to_string())
    }
}
