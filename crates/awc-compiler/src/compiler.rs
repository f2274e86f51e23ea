//! Workflow compilation driver.

use crate::engine::EngineRun;
use crate::error::Result;
use crate::jobs::{AgentJob, activation_job, reaction_job, side_effect_job};
use crate::mcp::McpServersConfig;
use crate::options::CompilerOptions;
use crate::triggers;
use awc_core::job::JobPermissions;
use awc_core::tools::{ENGINE_NATIVE_KEY, EngineNativeBlock, ToolConfig, ToolSpecification};
use awc_core::workflow::{EngineConfig, EngineSpec, WorkflowSpec};
use awc_graph::JobGraph;
use awc_permissions::{CompiledPermissions, PermissionCompiler};
use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

/// Comment placed above every generated document.
pub const GENERATED_HEADER: &str = "\
# This file was automatically generated by awc. DO NOT EDIT.
#
# To update it, edit the workflow source and run:
#   awc compile <workflow>
";

/// Result of one compilation.
#[derive(Debug)]
pub struct CompiledWorkflow {
    pub graph: JobGraph,
    pub permissions: CompiledPermissions,
    pub mcp_config: Option<McpServersConfig>,
    pub engine: EngineConfig,
    /// Full document, header comment included.
    pub yaml: String,
}

impl CompiledWorkflow {
    pub fn allowed_tools(&self) -> String {
        self.permissions.allowed_tools()
    }

    /// Job names in execution order.
    pub fn job_order(&self) -> Result<Vec<String>> {
        Ok(self.graph.topological_order()?)
    }
}

/// Compiles workflow definitions into CI documents.
///
/// Holds no per-compilation state; every call builds its own job graph.
#[derive(Debug, Default)]
pub struct WorkflowCompiler {
    options: CompilerOptions,
    permissions: PermissionCompiler,
}

impl WorkflowCompiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self {
            options,
            permissions: PermissionCompiler::new(),
        }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Parse and compile a YAML workflow definition.
    pub fn compile_str(&self, content: &str) -> Result<CompiledWorkflow> {
        let spec = WorkflowSpec::from_yaml(content)?;
        self.compile(&spec)
    }

    pub fn compile(&self, spec: &WorkflowSpec) -> Result<CompiledWorkflow> {
        let triggers = spec.triggers();
        triggers::validate(&triggers)?;

        let engine = spec
            .engine
            .as_ref()
            .map(EngineSpec::config)
            .unwrap_or_else(|| EngineConfig {
                id: self.options.engine,
                model: None,
                max_turns: None,
            });
        let side_effects = spec.side_effects();

        let mut tools = spec.tool_specification()?;
        let native = take_engine_native(&mut tools);
        let permissions = self
            .permissions
            .compile_with_native(native, &tools, side_effects)?;

        let mcp_config = McpServersConfig::from_tools(&permissions.tools)?;
        let mcp_json = mcp_config
            .as_ref()
            .map(McpServersConfig::to_json)
            .transpose()?;

        let runs_on = spec
            .runs_on
            .clone()
            .unwrap_or_else(|| Value::String(self.options.runs_on.clone()));
        let timeout_minutes = spec.timeout_minutes.unwrap_or(self.options.timeout_minutes);
        let allowed_tools = if engine.id.supports_tool_allowlist() {
            permissions.allowed_tools()
        } else {
            String::new()
        };

        let mut graph = JobGraph::new();
        graph.add_job(activation_job(
            spec.condition.as_deref(),
            triggers::command_name(&triggers),
            triggers::has_other_events(&triggers),
            runs_on.clone(),
        ))?;

        if let Some(reaction) = &triggers.reaction {
            graph.add_job(reaction_job(reaction, runs_on.clone()))?;
        }

        let agent = AgentJob {
            runs_on: runs_on.clone(),
            permissions: spec
                .permissions
                .clone()
                .unwrap_or_else(JobPermissions::read_all),
            prompt: &spec.prompt,
            mcp_config: mcp_json.as_deref(),
            engine: EngineRun {
                config: &engine,
                allowed_tools: &allowed_tools,
                timeout_minutes,
                has_mcp_servers: mcp_config.is_some(),
                has_side_effects: side_effects.is_some(),
            },
            side_effects,
        };
        graph.add_job(agent.build())?;

        if let Some(side_effects) = side_effects {
            for kind in side_effects.requested() {
                debug!(job = kind.job_name(), "Adding side-effect job");
                graph.add_job(side_effect_job(kind, side_effects, runs_on.clone()))?;
            }
        }

        graph.validate_dependencies()?;
        let yaml = render_document(&spec.name, triggers::render_on(&triggers), &graph)?;

        info!(
            workflow = %spec.name,
            engine = %engine.id,
            jobs = graph.len(),
            "Compiled workflow"
        );

        Ok(CompiledWorkflow {
            graph,
            permissions,
            mcp_config,
            engine,
            yaml,
        })
    }
}

/// Split a user-written engine-native block off the tool specification so the
/// permission compiler only sees neutral and MCP entries.
fn take_engine_native(tools: &mut ToolSpecification) -> EngineNativeBlock {
    match tools.remove(ENGINE_NATIVE_KEY) {
        Some(ToolConfig::EngineNative(block)) => block,
        Some(other) => {
            tools.insert(ENGINE_NATIVE_KEY, other);
            EngineNativeBlock::new()
        }
        None => EngineNativeBlock::new(),
    }
}

fn render_document(name: &str, on: Value, graph: &JobGraph) -> Result<String> {
    let mut document = Mapping::new();
    document.insert(Value::from("name"), Value::from(name));
    document.insert(Value::from("on"), on);
    document.insert(Value::from("jobs"), graph.to_yaml_value()?);

    let body = serde_yaml::to_string(&Value::Mapping(document))?;
    Ok(format!("{GENERATED_HEADER}\n{body}"))
}
