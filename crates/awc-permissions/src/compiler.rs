//! Allowed-tools compilation.
//!
//! The compiler threads one [`EngineNativeBlock`] through an ordered pipeline
//! of stages. Every stage only adds entries that are not already present, so
//! the pipeline is idempotent and never produces duplicate tokens.

use crate::error::{PermissionError, Result};
use awc_core::safe_outputs::SafeOutputsConfig;
use awc_core::tools::{
    AllowList, ENGINE_NATIVE_KEY, EngineNativeBlock, NeutralKind, NeutralTool, ToolConfig,
    ToolSpecification, WILDCARD,
};
use tracing::debug;

const BASH: &str = "Bash";
const WRITE: &str = "Write";

/// Any-arguments marker inside a Bash command list.
const ANY_ARGUMENTS: &str = ":*";

/// Permissions granted by the neutral `edit` tool.
const EDIT_TOOLS: &[&str] = &["Edit", "MultiEdit", "NotebookEdit", WRITE];

/// Read-only permissions every agent receives.
const DEFAULT_TOOLS: &[&str] = &[
    "Task",
    "Glob",
    "Grep",
    "LS",
    "ExitPlanMode",
    "TodoWrite",
    "Read",
    "NotebookRead",
];

/// Companions granted whenever any Bash access exists.
const BASH_COMPANIONS: &[&str] = &["KillBash", "BashOutput"];

/// Git subcommands needed to prepare a branch or push for a side effect.
const GIT_COMMANDS: &[&str] = &[
    "git checkout:*",
    "git branch:*",
    "git switch:*",
    "git add:*",
    "git rm:*",
    "git commit:*",
];

/// Output of a permission compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPermissions {
    /// Sorted, deduplicated permission tokens.
    pub tokens: Vec<String>,
    /// Tool specification with neutral entries replaced by the resolved
    /// engine-native block.
    pub tools: ToolSpecification,
}

impl CompiledPermissions {
    /// Comma-joined allow-list string.
    pub fn allowed_tools(&self) -> String {
        self.tokens.join(",")
    }
}

/// Compiles tool specifications into allowed-tools strings.
#[derive(Debug, Clone, Copy)]
pub struct PermissionCompiler;

impl PermissionCompiler {
    pub fn new() -> Self {
        Self
    }

    /// Compile a neutral tool specification.
    pub fn compile(
        &self,
        tools: &ToolSpecification,
        side_effects: Option<&SafeOutputsConfig>,
    ) -> Result<CompiledPermissions> {
        self.compile_with_native(EngineNativeBlock::new(), tools, side_effects)
    }

    /// Compile on top of an engine-native block the caller already resolved.
    ///
    /// Entries in `base` are preserved; neutral tools never overwrite them.
    pub fn compile_with_native(
        &self,
        base: EngineNativeBlock,
        tools: &ToolSpecification,
        side_effects: Option<&SafeOutputsConfig>,
    ) -> Result<CompiledPermissions> {
        ensure_neutral(tools)?;

        let mut native = base;
        expand_neutral_tools(tools, &mut native);
        inject_defaults(&mut native);
        add_bash_companions(&mut native);
        escalate_for_side_effects(&mut native, side_effects);

        let mut tokens = flatten(&native, tools);
        if side_effects.is_some() && !tokens.iter().any(|t| t == WRITE) {
            tokens.push(WRITE.to_string());
        }
        tokens.sort();

        debug!(
            tokens = tokens.len(),
            native = native.len(),
            "Compiled agent permissions"
        );

        Ok(CompiledPermissions {
            tokens,
            tools: resolved_tools(tools, native),
        })
    }
}

impl Default for PermissionCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_neutral(tools: &ToolSpecification) -> Result<()> {
    match tools.engine_native_keys().first() {
        Some(key) => Err(PermissionError::InvariantViolation(format!(
            "tool '{key}' is already an engine-native block; expected neutral tools only"
        ))),
        None => Ok(()),
    }
}

fn expand_neutral_tools(tools: &ToolSpecification, native: &mut EngineNativeBlock) {
    for (_, config) in tools.iter() {
        let ToolConfig::Neutral(NeutralTool { kind, commands }) = config else {
            continue;
        };
        match kind {
            NeutralKind::Bash => match commands {
                Some(commands) if commands.is_empty() => {}
                commands => {
                    native.insert_if_absent(BASH, commands.clone());
                }
            },
            NeutralKind::WebFetch => {
                native.insert_if_absent("WebFetch", None);
            }
            NeutralKind::WebSearch => {
                native.insert_if_absent("WebSearch", None);
            }
            NeutralKind::Edit => {
                for name in EDIT_TOOLS {
                    native.insert_if_absent(name, None);
                }
            }
        }
    }
}

fn inject_defaults(native: &mut EngineNativeBlock) {
    for name in DEFAULT_TOOLS {
        native.insert_if_absent(name, None);
    }
}

fn add_bash_companions(native: &mut EngineNativeBlock) {
    if !native.contains(BASH) {
        return;
    }
    for name in BASH_COMPANIONS {
        native.insert_if_absent(name, None);
    }
}

fn escalate_for_side_effects(
    native: &mut EngineNativeBlock,
    side_effects: Option<&SafeOutputsConfig>,
) {
    if !side_effects.is_some_and(SafeOutputsConfig::needs_write_access) {
        return;
    }
    // Unrestricted Bash already covers git and file edits.
    if is_unrestricted_bash(native.get(BASH)) {
        return;
    }

    for name in EDIT_TOOLS {
        native.insert_if_absent(name, None);
    }

    match native.get_mut(BASH) {
        Some(Some(commands)) => {
            for git in GIT_COMMANDS {
                if !commands.iter().any(|c| c == git) {
                    commands.push(git.to_string());
                }
            }
        }
        _ => {
            native.insert_if_absent(
                BASH,
                Some(GIT_COMMANDS.iter().map(|c| c.to_string()).collect()),
            );
        }
    }
}

/// No entry, or a literal command list without a universal marker, is restricted.
fn is_unrestricted_bash(entry: Option<&Option<Vec<String>>>) -> bool {
    match entry {
        None => false,
        Some(None) => true,
        Some(Some(commands)) => commands.iter().any(|c| is_universal(c)),
    }
}

fn is_universal(command: &str) -> bool {
    command == ANY_ARGUMENTS || command == WILDCARD
}

fn flatten(native: &EngineNativeBlock, tools: &ToolSpecification) -> Vec<String> {
    let mut tokens = Vec::new();

    for (name, commands) in native.iter() {
        if name == BASH {
            match commands {
                Some(commands) if !commands.iter().any(|c| is_universal(c)) => {
                    for command in commands {
                        push_unique(&mut tokens, format!("{BASH}({command})"));
                    }
                }
                // `:*` or `*` anywhere in the list absorbs every literal command.
                _ => push_unique(&mut tokens, BASH.to_string()),
            }
        } else if name.chars().next().is_some_and(char::is_uppercase) {
            push_unique(&mut tokens, name.clone());
        }
    }

    for (name, tool) in tools.mcp_tools() {
        match &tool.allowed {
            AllowList::All => push_unique(&mut tokens, format!("mcp__{name}")),
            AllowList::Only(subtools) => {
                for subtool in subtools {
                    push_unique(&mut tokens, format!("mcp__{name}__{subtool}"));
                }
            }
        }
    }

    tokens
}

fn push_unique(tokens: &mut Vec<String>, token: String) {
    if !tokens.contains(&token) {
        tokens.push(token);
    }
}

fn resolved_tools(tools: &ToolSpecification, native: EngineNativeBlock) -> ToolSpecification {
    let mut resolved: ToolSpecification = tools
        .iter()
        .filter(|(_, config)| !matches!(config, ToolConfig::Neutral(_)))
        .map(|(name, config)| (name.clone(), config.clone()))
        .collect();
    resolved.insert(ENGINE_NATIVE_KEY, ToolConfig::EngineNative(native));
    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::safe_outputs::{CreateIssueConfig, CreatePullRequestConfig};
    use awc_core::tools::McpTool;
    use pretty_assertions::assert_eq;

    const DEFAULTS: &str = "ExitPlanMode,Glob,Grep,LS,NotebookRead,Read,Task,TodoWrite";

    fn bash(commands: &[&str]) -> ToolSpecification {
        let commands = commands.iter().map(|c| c.to_string()).collect();
        [(
            "bash".to_string(),
            ToolConfig::Neutral(NeutralTool::bash(Some(commands))),
        )]
        .into_iter()
        .collect()
    }

    fn mcp(name: &str, allowed: &[&str]) -> ToolSpecification {
        [(
            name.to_string(),
            ToolConfig::Mcp(McpTool {
                transport: None,
                allowed: AllowList::from_names(allowed.iter().copied()),
            }),
        )]
        .into_iter()
        .collect()
    }

    fn issue_request() -> SafeOutputsConfig {
        SafeOutputsConfig {
            create_issue: Some(CreateIssueConfig::default()),
            ..Default::default()
        }
    }

    fn pull_request_request() -> SafeOutputsConfig {
        SafeOutputsConfig {
            create_pull_request: Some(CreatePullRequestConfig::default()),
            ..Default::default()
        }
    }

    fn compile(tools: &ToolSpecification, side_effects: Option<&SafeOutputsConfig>) -> Vec<String> {
        PermissionCompiler::new()
            .compile(tools, side_effects)
            .unwrap()
            .tokens
    }

    #[test]
    fn test_empty_input_yields_only_defaults() {
        let compiled = PermissionCompiler::new()
            .compile(&ToolSpecification::new(), None)
            .unwrap();
        assert_eq!(compiled.allowed_tools(), DEFAULTS);
    }

    #[test]
    fn test_bash_wildcard_absorbs_literal_commands() {
        let tokens = compile(&bash(&["echo", "ls", ":*", "cat"]), None);
        let bash_tokens: Vec<&str> = tokens
            .iter()
            .map(String::as_str)
            .filter(|t| t.contains("Bash"))
            .collect();
        assert_eq!(bash_tokens, vec!["Bash", "BashOutput", "KillBash"]);
    }

    #[test]
    fn test_bash_star_absorbs_literal_commands() {
        let tokens = compile(&bash(&["echo", "*"]), None);
        assert!(tokens.contains(&"Bash".to_string()));
        assert!(!tokens.iter().any(|t| t.starts_with("Bash(")));
    }

    #[test]
    fn test_bash_literal_commands() {
        let compiled = PermissionCompiler::new()
            .compile(&bash(&["echo", "ls"]), None)
            .unwrap();
        assert_eq!(
            compiled.allowed_tools(),
            "Bash(echo),Bash(ls),BashOutput,ExitPlanMode,Glob,Grep,KillBash,LS,\
             NotebookRead,Read,Task,TodoWrite"
        );
    }

    #[test]
    fn test_empty_bash_list_grants_no_bash() {
        let tokens = compile(&bash(&[]), None);
        assert!(!tokens.iter().any(|t| t.contains("Bash")));
    }

    #[test]
    fn test_neutral_tools_expand() {
        let tools: ToolSpecification = [
            ("edit", NeutralKind::Edit),
            ("web-fetch", NeutralKind::WebFetch),
            ("web-search", NeutralKind::WebSearch),
        ]
        .into_iter()
        .map(|(name, kind)| (name.to_string(), ToolConfig::Neutral(NeutralTool::new(kind))))
        .collect();

        let tokens = compile(&tools, None);
        for expected in ["Edit", "MultiEdit", "NotebookEdit", "Write", "WebFetch", "WebSearch"] {
            assert!(tokens.contains(&expected.to_string()), "missing {expected}");
        }
        assert!(!tokens.iter().any(|t| t.contains("Bash")));
    }

    #[test]
    fn test_mcp_wildcard() {
        let tokens = compile(&mcp("notion", &["*"]), None);
        let mcp_tokens: Vec<&String> = tokens.iter().filter(|t| t.starts_with("mcp__")).collect();
        assert_eq!(mcp_tokens, vec!["mcp__notion"]);
    }

    #[test]
    fn test_mcp_explicit_subtools() {
        let tokens = compile(&mcp("notion", &["list_issues", "create_issue"]), None);
        let mcp_tokens: Vec<&String> = tokens.iter().filter(|t| t.starts_with("mcp__")).collect();
        assert_eq!(
            mcp_tokens,
            vec!["mcp__notion__create_issue", "mcp__notion__list_issues"]
        );
    }

    #[test]
    fn test_engine_native_input_is_rejected() {
        let tools: ToolSpecification = [(
            ENGINE_NATIVE_KEY.to_string(),
            ToolConfig::EngineNative(EngineNativeBlock::new()),
        )]
        .into_iter()
        .collect();

        let err = PermissionCompiler::new().compile(&tools, None).unwrap_err();
        assert!(matches!(err, PermissionError::InvariantViolation(_)));
    }

    #[test]
    fn test_write_backstop_appended_once() {
        let tokens = compile(&ToolSpecification::new(), Some(&issue_request()));
        assert_eq!(tokens.iter().filter(|t| *t == "Write").count(), 1);
    }

    #[test]
    fn test_write_backstop_does_not_duplicate_existing_write() {
        let tools: ToolSpecification = [(
            "edit".to_string(),
            ToolConfig::Neutral(NeutralTool::new(NeutralKind::Edit)),
        )]
        .into_iter()
        .collect();
        let tokens = compile(&tools, Some(&issue_request()));
        assert_eq!(tokens.iter().filter(|t| *t == "Write").count(), 1);
    }

    #[test]
    fn test_no_side_effect_no_write() {
        let tokens = compile(&ToolSpecification::new(), None);
        assert!(!tokens.contains(&"Write".to_string()));
    }

    #[test]
    fn test_pull_request_escalation_creates_git_bash() {
        let tokens = compile(&ToolSpecification::new(), Some(&pull_request_request()));
        for git in GIT_COMMANDS {
            assert!(tokens.contains(&format!("Bash({git})")), "missing {git}");
        }
        for edit in EDIT_TOOLS {
            assert!(tokens.contains(&edit.to_string()));
        }
    }

    #[test]
    fn test_git_only_bash_gets_no_companions() {
        let tokens = compile(&ToolSpecification::new(), Some(&pull_request_request()));
        assert!(!tokens.contains(&"KillBash".to_string()));
        assert!(!tokens.contains(&"BashOutput".to_string()));
    }

    #[test]
    fn test_declared_bash_keeps_companions_with_escalation() {
        let tokens = compile(&bash(&["make test"]), Some(&pull_request_request()));
        assert!(tokens.contains(&"KillBash".to_string()));
        assert!(tokens.contains(&"BashOutput".to_string()));
        assert!(tokens.contains(&"Bash(git commit:*)".to_string()));
    }

    #[test]
    fn test_pull_request_escalation_merges_missing_git_commands() {
        let compiled = PermissionCompiler::new()
            .compile(
                &bash(&["git add:*", "make test"]),
                Some(&pull_request_request()),
            )
            .unwrap();
        let block = compiled.tools.engine_native().unwrap();
        let commands = block.get("Bash").unwrap().as_ref().unwrap();
        assert_eq!(commands.len(), 7);
        assert_eq!(commands.iter().filter(|c| *c == "git add:*").count(), 1);
        assert_eq!(commands[1], "make test");
    }

    #[test]
    fn test_pull_request_escalation_leaves_wildcard_list_alone() {
        let compiled = PermissionCompiler::new()
            .compile(&bash(&["echo", ":*"]), Some(&pull_request_request()))
            .unwrap();
        let block = compiled.tools.engine_native().unwrap();
        assert_eq!(
            block.get("Bash"),
            Some(&Some(vec!["echo".to_string(), ":*".to_string()]))
        );
        assert!(!block.contains("Edit"));
        assert!(!block.contains("MultiEdit"));
    }

    #[test]
    fn test_pull_request_escalation_keeps_unrestricted_bash() {
        let tools: ToolSpecification = [(
            "bash".to_string(),
            ToolConfig::Neutral(NeutralTool::bash(None)),
        )]
        .into_iter()
        .collect();
        let compiled = PermissionCompiler::new()
            .compile(&tools, Some(&pull_request_request()))
            .unwrap();
        assert_eq!(compiled.tools.engine_native().unwrap().get("Bash"), Some(&None));
        assert!(compiled.tokens.contains(&"Bash".to_string()));
        assert!(!compiled.tokens.iter().any(|t| t.starts_with("Bash(")));
        for edit in ["Edit", "MultiEdit", "NotebookEdit"] {
            assert!(!compiled.tokens.contains(&edit.to_string()), "unexpected {edit}");
        }
        assert_eq!(compiled.tokens.iter().filter(|t| *t == "Write").count(), 1);
    }

    #[test]
    fn test_existing_native_entries_are_preserved() {
        let base: EngineNativeBlock =
            [("Bash".to_string(), Some(vec!["git status".to_string()]))]
                .into_iter()
                .collect();
        let tools: ToolSpecification = [(
            "bash".to_string(),
            ToolConfig::Neutral(NeutralTool::bash(None)),
        )]
        .into_iter()
        .collect();

        let compiled = PermissionCompiler::new()
            .compile_with_native(base, &tools, None)
            .unwrap();
        assert!(compiled.tokens.contains(&"Bash(git status)".to_string()));
        assert!(!compiled.tokens.contains(&"Bash".to_string()));
    }

    #[test]
    fn test_lowercase_native_names_are_dropped() {
        let base: EngineNativeBlock = [("leftover".to_string(), None)].into_iter().collect();
        let compiled = PermissionCompiler::new()
            .compile_with_native(base, &ToolSpecification::new(), None)
            .unwrap();
        assert_eq!(compiled.allowed_tools(), DEFAULTS);
    }

    #[test]
    fn test_mutated_tools_replace_neutral_entries() {
        let mut tools = bash(&["ls"]);
        tools.insert(
            "github",
            ToolConfig::Mcp(McpTool {
                transport: None,
                allowed: AllowList::All,
            }),
        );
        let compiled = PermissionCompiler::new().compile(&tools, None).unwrap();
        assert!(compiled.tools.get("bash").is_none());
        assert!(compiled.tools.get("github").is_some());
        let native = compiled.tools.engine_native().unwrap();
        assert!(native.contains("Read"));
        assert!(native.contains("KillBash"));
    }

    #[test]
    fn test_tokens_sorted_and_unique() {
        let mut tools = bash(&["ls", "echo"]);
        tools.insert(
            "edit",
            ToolConfig::Neutral(NeutralTool::new(NeutralKind::Edit)),
        );
        for (name, tool) in mcp("github", &["get_issue", "list_issues"]).iter() {
            tools.insert(name.clone(), tool.clone());
        }
        let tokens = compile(&tools, Some(&pull_request_request()));

        let mut sorted = tokens.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(tokens, sorted);
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let tools = bash(&["ls", "echo"]);
        let request = pull_request_request();
        let first = PermissionCompiler::new()
            .compile(&tools, Some(&request))
            .unwrap();
        let second = PermissionCompiler::new()
            .compile(&tools, Some(&request))
            .unwrap();
        assert_eq!(first.allowed_tools(), second.allowed_tools());
    }

    #[test]
    fn test_classified_yaml_tools() {
        let raw = serde_yaml::from_str(
            "bash: [\"echo\"]\ngithub:\n  allowed: [get_issue]\nnotes:\n  size: 3\n",
        )
        .unwrap();
        let tools = ToolSpecification::from_raw(&raw).unwrap();
        let tokens = compile(&tools, None);
        assert!(tokens.contains(&"Bash(echo)".to_string()));
        assert!(tokens.contains(&"mcp__github__get_issue".to_string()));
        assert!(!tokens.iter().any(|t| t.contains("notes")));
    }
}
