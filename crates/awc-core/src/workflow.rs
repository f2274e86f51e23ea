//! Workflow definition types.
//!
//! These types represent the user-authored workflow configuration as it
//! arrives from the frontmatter parser.

use crate::error::{Error, Result};
use crate::job::JobPermissions;
use crate::safe_outputs::SafeOutputsConfig;
use crate::tools::ToolSpecification;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkflowSpec {
    pub name: String,
    #[serde(default)]
    pub on: TriggerSpec,
    /// Extra guard for the whole workflow, with or without `${{ }}`.
    #[serde(default, rename = "if")]
    pub condition: Option<String>,
    #[serde(default)]
    pub engine: Option<EngineSpec>,
    #[serde(default, rename = "runs-on")]
    #[schemars(with = "Option<serde_json::Value>")]
    pub runs_on: Option<serde_yaml::Value>,
    #[serde(default, alias = "timeout-minutes")]
    pub timeout_minutes: Option<u32>,
    #[serde(default)]
    pub permissions: Option<JobPermissions>,
    #[serde(default)]
    #[schemars(with = "BTreeMap<String, serde_json::Value>")]
    pub tools: BTreeMap<String, serde_yaml::Value>,
    #[serde(default, rename = "safe-outputs")]
    pub safe_outputs: Option<SafeOutputsConfig>,
    #[serde(default)]
    pub prompt: String,
}

impl WorkflowSpec {
    pub fn from_yaml(content: &str) -> Result<Self> {
        let spec: Self = serde_yaml::from_str(content)?;
        if spec.name.trim().is_empty() {
            return Err(Error::InvalidWorkflow("workflow name is empty".to_string()));
        }
        Ok(spec)
    }

    pub fn tool_specification(&self) -> Result<ToolSpecification> {
        ToolSpecification::from_raw(&self.tools)
    }

    pub fn triggers(&self) -> Triggers {
        self.on.clone().into_triggers()
    }

    /// The side-effect request, `None` when nothing was requested.
    pub fn side_effects(&self) -> Option<&SafeOutputsConfig> {
        self.safe_outputs.as_ref().filter(|config| !config.is_empty())
    }
}

/// The `on:` section in any of its accepted shapes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum TriggerSpec {
    Event(String),
    Events(Vec<String>),
    Detailed(Triggers),
}

impl Default for TriggerSpec {
    fn default() -> Self {
        Self::Detailed(Triggers::default())
    }
}

impl TriggerSpec {
    pub fn into_triggers(self) -> Triggers {
        match self {
            Self::Event(name) => Triggers::from_event_names([name]),
            Self::Events(names) => Triggers::from_event_names(names),
            Self::Detailed(triggers) => triggers,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct Triggers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<CommandTrigger>,
    /// Emoji reaction added to the triggering item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction: Option<String>,
    /// Every other event, passed through to the rendered `on:` section.
    #[serde(flatten)]
    #[schemars(with = "BTreeMap<String, serde_json::Value>")]
    pub events: BTreeMap<String, serde_yaml::Value>,
}

impl Triggers {
    fn from_event_names(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            events: names
                .into_iter()
                .map(|name| (name, serde_yaml::Value::Null))
                .collect(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CommandTrigger {
    /// Command token without the leading slash.
    pub name: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    #[default]
    Claude,
    Codex,
}

impl EngineKind {
    /// Whether the engine consumes an allowed-tools string.
    pub fn supports_tool_allowlist(&self) -> bool {
        matches!(self, Self::Claude)
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Claude => write!(f, "claude"),
            Self::Codex => write!(f, "codex"),
        }
    }
}

impl std::str::FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "claude" => Ok(Self::Claude),
            "codex" => Ok(Self::Codex),
            other => Err(Error::InvalidWorkflow(format!("unknown engine: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum EngineSpec {
    Id(EngineKind),
    Detailed(EngineConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct EngineConfig {
    pub id: EngineKind,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_turns: Option<u32>,
}

impl EngineSpec {
    pub fn config(&self) -> EngineConfig {
        match self {
            Self::Id(id) => EngineConfig {
                id: *id,
                model: None,
                max_turns: None,
            },
            Self::Detailed(config) => config.clone(),
        }
    }
}
