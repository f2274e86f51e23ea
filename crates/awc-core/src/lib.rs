//! Agentic Workflow Compiler Core
//!
//! Core domain types and error handling for the workflow compiler.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the expression, permission, graph and compiler crates.

pub mod error;
pub mod job;
pub mod safe_outputs;
pub mod tools;
pub mod workflow;

pub use error::{Error, Result};
