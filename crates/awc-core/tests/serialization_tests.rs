//! Workflow definition parsing tests.

use awc_core::safe_outputs::SafeOutputKind;
use awc_core::tools::{AllowList, McpTransport, NeutralKind, ToolConfig};
use awc_core::workflow::{EngineKind, WorkflowSpec};
use pretty_assertions::assert_eq;

const WORKFLOW: &str = r#"
name: Issue triage
on:
  command:
    name: triage
  reaction: eyes
engine:
  id: codex
  model: o4-mini
runs-on: [self-hosted, linux]
timeout_minutes: 20
permissions:
  contents: read
  issues: read
tools:
  bash: ["echo", "ls"]
  edit:
  web-search: false
  github:
    allowed: [list_issues]
  notion:
    command: npx
    args: ["-y", "@notionhq/mcp"]
    allowed: ["*"]
  docs:
    url: https://mcp.example.com/sse
  custom-thing:
    enabled: yes
safe-outputs:
  create-issue: { title-prefix: "[bot] ", labels: [triage], max: 1 }
  add-issue-labels: { allowed: [bug, enhancement] }
prompt: Triage the issue.
"#;

#[test]
fn test_tool_classification() {
    let spec = WorkflowSpec::from_yaml(WORKFLOW).unwrap();
    let tools = spec.tool_specification().unwrap();

    let names: Vec<&str> = tools.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(
        names,
        vec!["bash", "custom-thing", "docs", "edit", "github", "notion"]
    );

    match tools.get("bash") {
        Some(ToolConfig::Neutral(tool)) => {
            assert_eq!(tool.kind, NeutralKind::Bash);
            assert_eq!(
                tool.commands,
                Some(vec!["echo".to_string(), "ls".to_string()])
            );
        }
        other => panic!("bash classified as {other:?}"),
    }

    match tools.get("github") {
        Some(ToolConfig::Mcp(tool)) => {
            assert!(tool.transport.is_none());
            assert_eq!(tool.allowed, AllowList::from_names(["list_issues"]));
        }
        other => panic!("github classified as {other:?}"),
    }

    match tools.get("notion") {
        Some(ToolConfig::Mcp(tool)) => {
            assert_eq!(tool.allowed, AllowList::All);
            assert!(matches!(
                tool.transport,
                Some(McpTransport::Stdio { ref command, .. }) if command == "npx"
            ));
        }
        other => panic!("notion classified as {other:?}"),
    }

    assert!(matches!(
        tools.get("docs"),
        Some(ToolConfig::Mcp(tool)) if matches!(tool.transport, Some(McpTransport::Http { .. }))
    ));
    assert!(matches!(
        tools.get("custom-thing"),
        Some(ToolConfig::Unclassified(_))
    ));
    assert!(tools.get("web-search").is_none());
}

#[test]
fn test_workflow_settings() {
    let spec = WorkflowSpec::from_yaml(WORKFLOW).unwrap();

    let engine = spec.engine.as_ref().unwrap().config();
    assert_eq!(engine.id, EngineKind::Codex);
    assert_eq!(engine.model.as_deref(), Some("o4-mini"));

    assert_eq!(spec.timeout_minutes, Some(20));
    assert!(matches!(spec.runs_on, Some(serde_yaml::Value::Sequence(_))));

    let side_effects = spec.side_effects().unwrap();
    assert_eq!(
        side_effects.requested(),
        vec![SafeOutputKind::CreateIssue, SafeOutputKind::AddIssueLabels]
    );
    let issue = side_effects.create_issue.as_ref().unwrap();
    assert_eq!(issue.title_prefix.as_deref(), Some("[bot] "));
    assert_eq!(issue.labels, vec!["triage"]);
}

#[test]
fn test_workflow_survives_reserialization() {
    let spec = WorkflowSpec::from_yaml(WORKFLOW).unwrap();
    let yaml = serde_yaml::to_string(&spec).unwrap();
    let reparsed = WorkflowSpec::from_yaml(&yaml).unwrap();

    assert_eq!(reparsed.name, spec.name);
    assert_eq!(reparsed.tools, spec.tools);
    assert_eq!(reparsed.safe_outputs, spec.safe_outputs);
    assert_eq!(
        reparsed.triggers().command.map(|c| c.name),
        Some("triage".to_string())
    );
}
