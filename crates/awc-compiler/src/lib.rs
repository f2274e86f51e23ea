//! Agentic Workflow Compiler
//!
//! Drives one compilation: guards come from `awc-expr`, the agent's tool
//! allow-list from `awc-permissions`, and every job lands in one
//! `awc-graph` job graph that is validated and rendered as a CI document.

pub mod compiler;
pub mod engine;
pub mod error;
pub mod jobs;
pub mod mcp;
pub mod options;
pub mod triggers;

mod scripts;

pub use compiler::{CompiledWorkflow, GENERATED_HEADER, WorkflowCompiler};
pub use error::{CompileError, Result};
pub use mcp::McpServersConfig;
pub use options::CompilerOptions;
