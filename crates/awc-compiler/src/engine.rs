//! Agent engine steps.

use crate::mcp::MCP_CONFIG_PATH;
use awc_core::job::Step;
use awc_core::workflow::{EngineConfig, EngineKind};

pub const PROMPT_PATH: &str = "/tmp/aw-prompts/prompt.txt";
pub const SAFE_OUTPUTS_PATH: &str = "/tmp/aw-safe-outputs/output.jsonl";
pub const SAFE_OUTPUTS_ENV: &str = "GITHUB_AW_SAFE_OUTPUTS";

/// Id of the step that runs the agent.
pub const EXECUTION_STEP_ID: &str = "agentic_execution";

const CLAUDE_ACTION: &str = "anthropics/claude-code-base-action@v0.0.56";
const CODEX_PACKAGE: &str = "@openai/codex";

/// Everything the engine step needs from the rest of the compilation.
#[derive(Debug, Clone)]
pub struct EngineRun<'a> {
    pub config: &'a EngineConfig,
    /// Comma-joined allow-list string; only Claude receives it.
    pub allowed_tools: &'a str,
    pub timeout_minutes: u32,
    pub has_mcp_servers: bool,
    pub has_side_effects: bool,
}

/// Steps that install (when needed) and run the engine.
pub fn engine_steps(run: &EngineRun<'_>) -> Vec<Step> {
    match run.config.id {
        EngineKind::Claude => vec![claude_step(run)],
        EngineKind::Codex => vec![
            Step::run("Install Codex", format!("npm install -g {CODEX_PACKAGE}")),
            codex_step(run),
        ],
    }
}

fn claude_step(run: &EngineRun<'_>) -> Step {
    let mut step = Step::uses("Execute Claude Code Action", CLAUDE_ACTION)
        .with_id(EXECUTION_STEP_ID)
        .with_input("prompt_file", PROMPT_PATH)
        .with_input("anthropic_api_key", "${{ secrets.ANTHROPIC_API_KEY }}")
        .with_input("timeout_minutes", run.timeout_minutes.to_string());

    if !run.allowed_tools.is_empty() {
        step = step.with_input("allowed_tools", run.allowed_tools);
    }
    if run.has_mcp_servers {
        step = step.with_input("mcp_config", MCP_CONFIG_PATH);
    }
    if let Some(model) = &run.config.model {
        step = step.with_input("model", model.as_str());
    }
    if let Some(turns) = run.config.max_turns {
        step = step.with_input("max_turns", turns.to_string());
    }
    if run.has_side_effects {
        step = step.with_env(SAFE_OUTPUTS_ENV, SAFE_OUTPUTS_PATH);
    }
    step
}

fn codex_step(run: &EngineRun<'_>) -> Step {
    let mut command = String::from("codex exec --full-auto");
    if let Some(model) = &run.config.model {
        command.push_str(&format!(" -m {model}"));
    }
    command.push_str(&format!(" \"$(cat {PROMPT_PATH})\""));

    let mut step = Step::run("Run Codex", command)
        .with_id(EXECUTION_STEP_ID)
        .with_env("OPENAI_API_KEY", "${{ secrets.OPENAI_API_KEY }}");
    if run.has_side_effects {
        step = step.with_env(SAFE_OUTPUTS_ENV, SAFE_OUTPUTS_PATH);
    }
    step
}
