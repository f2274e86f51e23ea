//! Job graph construction, validation and rendering.

pub mod graph;
pub mod render;

pub use graph::{GraphError, JobGraph, Result};
