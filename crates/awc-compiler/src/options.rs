//! Compiler defaults applied when a workflow leaves a setting out.

use awc_core::workflow::EngineKind;

pub const DEFAULT_RUNS_ON: &str = "ubuntu-latest";
pub const DEFAULT_TIMEOUT_MINUTES: u32 = 15;

#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    /// Engine used when the workflow has no `engine:` entry.
    pub engine: EngineKind,
    /// Runner label used when the workflow has no `runs-on:` entry.
    pub runs_on: String,
    /// Agent job timeout used when the workflow sets none.
    pub timeout_minutes: u32,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            runs_on: DEFAULT_RUNS_ON.to_string(),
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
        }
    }
}

impl CompilerOptions {
    pub fn with_engine(mut self, engine: EngineKind) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_runs_on(mut self, runs_on: impl Into<String>) -> Self {
        self.runs_on = runs_on.into();
        self
    }

    pub fn with_timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = minutes;
        self
    }
}
