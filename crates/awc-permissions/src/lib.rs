//! Permission compilation for agent engines.
//!
//! Turns an engine-agnostic tool specification, plus the side effects a
//! workflow requested, into the sorted allow-list string that restricts
//! which tools the agent may call.

pub mod compiler;
pub mod error;

pub use compiler::{CompiledPermissions, PermissionCompiler};
pub use error::{PermissionError, Result};
