//! Tool specification types.
//!
//! A workflow declares its tools as a mapping from namespace name to a
//! configuration. Each entry is classified into one of the [`ToolConfig`]
//! variants before any compiler stage sees it.

use crate::error::{Error, Result};
use serde_yaml::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Key under which an engine-native permission block lives.
pub const ENGINE_NATIVE_KEY: &str = "claude";

/// MCP servers recognised by name alone, without transport metadata.
pub const RESERVED_MCP_TOOLS: &[&str] = &["github", "playwright"];

/// Universal allow-list marker.
pub const WILDCARD: &str = "*";

/// Engine-agnostic capability kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NeutralKind {
    Bash,
    WebFetch,
    WebSearch,
    Edit,
}

impl NeutralKind {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "bash" => Some(Self::Bash),
            "web-fetch" => Some(Self::WebFetch),
            "web-search" => Some(Self::WebSearch),
            "edit" => Some(Self::Edit),
            _ => None,
        }
    }
}

/// An engine-agnostic tool declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeutralTool {
    pub kind: NeutralKind,
    /// Literal command list, only meaningful for `bash`. `None` is unrestricted.
    pub commands: Option<Vec<String>>,
}

impl NeutralTool {
    pub fn new(kind: NeutralKind) -> Self {
        Self {
            kind,
            commands: None,
        }
    }

    pub fn bash(commands: Option<Vec<String>>) -> Self {
        Self {
            kind: NeutralKind::Bash,
            commands,
        }
    }
}

/// Which sub-tools of an MCP server the agent may call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowList {
    /// The universal `*` marker.
    All,
    Only(BTreeSet<String>),
}

impl AllowList {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: BTreeSet<String> = names.into_iter().map(Into::into).collect();
        if names.len() == 1 && names.contains(WILDCARD) {
            Self::All
        } else {
            Self::Only(names)
        }
    }
}

/// How an MCP server is reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpTransport {
    Stdio {
        command: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
    Http {
        url: String,
        headers: BTreeMap<String, String>,
    },
    Container {
        image: String,
        args: Vec<String>,
        env: BTreeMap<String, String>,
    },
}

/// A tool backed by an external MCP server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McpTool {
    /// `None` for reserved servers identified by name only.
    pub transport: Option<McpTransport>,
    pub allowed: AllowList,
}

/// Permission map already expressed in the agent's own vocabulary.
///
/// Values are optional literal command lists; only `Bash` uses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineNativeBlock(BTreeMap<String, Option<Vec<String>>>);

impl EngineNativeBlock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Option<Vec<String>>> {
        self.0.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Option<Vec<String>>> {
        self.0.get_mut(name)
    }

    /// Insert a permission unless one with the same name already exists.
    /// Returns whether the block changed.
    pub fn insert_if_absent(&mut self, name: &str, commands: Option<Vec<String>>) -> bool {
        if self.0.contains_key(name) {
            return false;
        }
        self.0.insert(name.to_string(), commands);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<Vec<String>>)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Option<Vec<String>>)> for EngineNativeBlock {
    fn from_iter<T: IntoIterator<Item = (String, Option<Vec<String>>)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A single classified tool entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolConfig {
    Neutral(NeutralTool),
    Mcp(McpTool),
    EngineNative(EngineNativeBlock),
    /// Entries that are neither neutral, engine-native nor MCP. Carried
    /// through untouched and ignored by permission compilation.
    Unclassified(Value),
}

/// Mapping from tool namespace to its classified configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSpecification(BTreeMap<String, ToolConfig>);

impl ToolSpecification {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify the raw `tools:` mapping of a workflow.
    pub fn from_raw(raw: &BTreeMap<String, Value>) -> Result<Self> {
        let mut tools = Self::new();
        for (name, value) in raw {
            if let Some(config) = classify(name, value)? {
                tools.insert(name.clone(), config);
            }
        }
        Ok(tools)
    }

    pub fn insert(&mut self, name: impl Into<String>, config: ToolConfig) -> Option<ToolConfig> {
        self.0.insert(name.into(), config)
    }

    pub fn get(&self, name: &str) -> Option<&ToolConfig> {
        self.0.get(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<ToolConfig> {
        self.0.remove(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ToolConfig)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Names of entries holding an engine-native block.
    pub fn engine_native_keys(&self) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(_, config)| matches!(config, ToolConfig::EngineNative(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// MCP entries in name order.
    pub fn mcp_tools(&self) -> impl Iterator<Item = (&String, &McpTool)> {
        self.0.iter().filter_map(|(name, config)| match config {
            ToolConfig::Mcp(tool) => Some((name, tool)),
            _ => None,
        })
    }

    pub fn engine_native(&self) -> Option<&EngineNativeBlock> {
        match self.0.get(ENGINE_NATIVE_KEY) {
            Some(ToolConfig::EngineNative(block)) => Some(block),
            _ => None,
        }
    }
}

impl FromIterator<(String, ToolConfig)> for ToolSpecification {
    fn from_iter<T: IntoIterator<Item = (String, ToolConfig)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

fn invalid(name: &str, reason: impl Into<String>) -> Error {
    Error::InvalidTool {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Returns `None` when the entry is explicitly disabled (`false`).
fn classify(name: &str, value: &Value) -> Result<Option<ToolConfig>> {
    if matches!(value, Value::Bool(false)) {
        return Ok(None);
    }

    if let Some(kind) = NeutralKind::from_key(name) {
        let commands = match (kind, value) {
            (NeutralKind::Bash, Value::Sequence(items)) => Some(string_list(name, items)?),
            (NeutralKind::Bash, Value::Null | Value::Bool(true)) => None,
            (NeutralKind::Bash, _) => {
                return Err(invalid(name, "expected a command list, null or true"));
            }
            (_, Value::Null | Value::Bool(true) | Value::Mapping(_)) => None,
            (_, _) => return Err(invalid(name, "expected null, true or a mapping")),
        };
        return Ok(Some(ToolConfig::Neutral(NeutralTool { kind, commands })));
    }

    if name == ENGINE_NATIVE_KEY {
        return engine_native_block(name, value).map(|b| Some(ToolConfig::EngineNative(b)));
    }

    let reserved = RESERVED_MCP_TOOLS.contains(&name);
    let transport = transport(name, value)?;
    if reserved || transport.is_some() {
        let allowed = match value.get("allowed") {
            Some(Value::Sequence(items)) => AllowList::from_names(string_list(name, items)?),
            Some(Value::Null) | None => AllowList::All,
            Some(_) => return Err(invalid(name, "'allowed' must be a list of tool names")),
        };
        return Ok(Some(ToolConfig::Mcp(McpTool { transport, allowed })));
    }

    Ok(Some(ToolConfig::Unclassified(value.clone())))
}

fn engine_native_block(name: &str, value: &Value) -> Result<EngineNativeBlock> {
    let allowed = match value.get("allowed") {
        Some(Value::Mapping(map)) => map,
        Some(Value::Null) | None => return Ok(EngineNativeBlock::new()),
        Some(_) => return Err(invalid(name, "'allowed' must be a mapping")),
    };

    let mut block = EngineNativeBlock::new();
    for (key, entry) in allowed {
        let Value::String(permission) = key else {
            return Err(invalid(name, "permission names must be strings"));
        };
        let commands = match entry {
            Value::Null => None,
            Value::Sequence(items) => Some(string_list(name, items)?),
            _ => return Err(invalid(name, format!("'{permission}' must be null or a list"))),
        };
        block.insert_if_absent(permission, commands);
    }
    Ok(block)
}

fn transport(name: &str, value: &Value) -> Result<Option<McpTransport>> {
    let Value::Mapping(_) = value else {
        return Ok(None);
    };

    let declared_type = value.get("type").and_then(Value::as_str);
    let command = value.get("command").and_then(Value::as_str);
    let url = value.get("url").and_then(Value::as_str);
    let container = value.get("container").and_then(Value::as_str);

    let transport = match (declared_type, command, url, container) {
        (_, _, _, Some(image)) => McpTransport::Container {
            image: image.to_string(),
            args: optional_list(name, value, "args")?,
            env: optional_map(name, value, "env")?,
        },
        (Some("http"), _, Some(url), _) | (None, None, Some(url), _) => McpTransport::Http {
            url: url.to_string(),
            headers: optional_map(name, value, "headers")?,
        },
        (Some("stdio") | None, Some(command), _, _) => McpTransport::Stdio {
            command: command.to_string(),
            args: optional_list(name, value, "args")?,
            env: optional_map(name, value, "env")?,
        },
        (Some("http"), _, None, _) => return Err(invalid(name, "http transport requires 'url'")),
        (Some("stdio"), None, _, _) => {
            return Err(invalid(name, "stdio transport requires 'command'"));
        }
        (Some(other), _, _, _) => {
            return Err(invalid(name, format!("unsupported transport type '{other}'")));
        }
        (None, None, None, None) => return Ok(None),
    };
    Ok(Some(transport))
}

fn string_list(name: &str, items: &[Value]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            _ => Err(invalid(name, "list entries must be strings")),
        })
        .collect()
}

fn optional_list(name: &str, value: &Value, key: &str) -> Result<Vec<String>> {
    match value.get(key) {
        Some(Value::Sequence(items)) => string_list(name, items),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(_) => Err(invalid(name, format!("'{key}' must be a list"))),
    }
}

fn optional_map(name: &str, value: &Value, key: &str) -> Result<BTreeMap<String, String>> {
    match value.get(key) {
        Some(Value::Mapping(map)) => map
            .iter()
            .map(|(k, v)| match (k, v) {
                (Value::String(k), Value::String(v)) => Ok((k.clone(), v.clone())),
                _ => Err(invalid(name, format!("'{key}' must map strings to strings"))),
            })
            .collect(),
        Some(Value::Null) | None => Ok(BTreeMap::new()),
        Some(_) => Err(invalid(name, format!("'{key}' must be a mapping"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(yaml: &str) -> BTreeMap<String, Value> {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_classify_neutral_tools() {
        let tools = ToolSpecification::from_raw(&raw(
            "bash: [\"echo\", \"ls\"]\nedit:\nweb-fetch: true\nweb-search: {}\n",
        ))
        .unwrap();

        assert_eq!(
            tools.get("bash"),
            Some(&ToolConfig::Neutral(NeutralTool::bash(Some(vec![
                "echo".to_string(),
                "ls".to_string()
            ]))))
        );
        assert_eq!(
            tools.get("edit"),
            Some(&ToolConfig::Neutral(NeutralTool::new(NeutralKind::Edit)))
        );
        assert_eq!(tools.len(), 4);
    }

    #[test]
    fn test_disabled_tool_is_dropped() {
        let tools = ToolSpecification::from_raw(&raw("bash: false\nedit:\n")).unwrap();
        assert!(tools.get("bash").is_none());
        assert!(tools.get("edit").is_some());
    }

    #[test]
    fn test_reserved_mcp_without_allowed_is_universal() {
        let tools = ToolSpecification::from_raw(&raw("github:\n")).unwrap();
        let (_, github) = tools.mcp_tools().next().unwrap();
        assert_eq!(github.allowed, AllowList::All);
        assert!(github.transport.is_none());
    }

    #[test]
    fn test_mcp_by_transport_metadata() {
        let tools = ToolSpecification::from_raw(&raw(
            "notion:\n  command: npx\n  args: [\"-y\", \"notion-mcp\"]\n  allowed: [list_issues, create_issue]\n",
        ))
        .unwrap();

        let ToolConfig::Mcp(notion) = tools.get("notion").unwrap() else {
            panic!("notion should be an MCP tool");
        };
        assert!(matches!(
            notion.transport,
            Some(McpTransport::Stdio { ref command, .. }) if command == "npx"
        ));
        assert_eq!(
            notion.allowed,
            AllowList::Only(["create_issue", "list_issues"].map(String::from).into())
        );
    }

    #[test]
    fn test_http_transport() {
        let tools =
            ToolSpecification::from_raw(&raw("docs:\n  url: https://mcp.example.com\n")).unwrap();
        let ToolConfig::Mcp(docs) = tools.get("docs").unwrap() else {
            panic!("docs should be an MCP tool");
        };
        assert!(matches!(docs.transport, Some(McpTransport::Http { .. })));
    }

    #[test]
    fn test_unknown_entry_is_unclassified() {
        let tools = ToolSpecification::from_raw(&raw("memory:\n  size: 3\n")).unwrap();
        assert!(matches!(
            tools.get("memory"),
            Some(ToolConfig::Unclassified(_))
        ));
        assert_eq!(tools.mcp_tools().count(), 0);
    }

    #[test]
    fn test_engine_native_block() {
        let tools = ToolSpecification::from_raw(&raw(
            "claude:\n  allowed:\n    Bash: [\"git status\"]\n    Read:\n",
        ))
        .unwrap();

        assert_eq!(tools.engine_native_keys(), vec!["claude"]);
        let block = tools.engine_native().unwrap();
        assert_eq!(block.get("Bash"), Some(&Some(vec!["git status".to_string()])));
        assert_eq!(block.get("Read"), Some(&None));
    }

    #[test]
    fn test_invalid_bash_value() {
        let err = ToolSpecification::from_raw(&raw("bash: 3\n")).unwrap_err();
        assert!(matches!(err, Error::InvalidTool { ref name, .. } if name == "bash"));
    }

    #[test]
    fn test_unsupported_transport_type() {
        let err =
            ToolSpecification::from_raw(&raw("x:\n  type: sse\n  url: http://a\n")).unwrap_err();
        assert!(err.to_string().contains("unsupported transport type"));
    }

    #[test]
    fn test_insert_if_absent_keeps_existing() {
        let mut block = EngineNativeBlock::new();
        assert!(block.insert_if_absent("Bash", Some(vec!["ls".to_string()])));
        assert!(!block.insert_if_absent("Bash", None));
        assert_eq!(block.get("Bash"), Some(&Some(vec!["ls".to_string()])));
    }
}
