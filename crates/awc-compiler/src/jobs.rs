//! Job builders, one per pipeline stage.

use crate::engine::{self, EngineRun, PROMPT_PATH, SAFE_OUTPUTS_ENV, SAFE_OUTPUTS_PATH};
use crate::mcp::MCP_CONFIG_PATH;
use crate::scripts;
use awc_core::job::{Job, JobPermissions, Step};
use awc_core::safe_outputs::{SafeOutputKind, SafeOutputsConfig};
use awc_expr::{
    COMMENT_EVENTS, ConditionNode, any_event, command_condition, event_is, merge_condition,
    property_not_equals, strip_expression_wrapper,
};
use serde_yaml::Value;

pub const ACTIVATION_JOB: &str = "activation";
pub const REACTION_JOB: &str = "add_reaction";
pub const AGENT_JOB: &str = "agent";

const CHECKOUT_ACTION: &str = "actions/checkout@v4";
const UPLOAD_ACTION: &str = "actions/upload-artifact@v4";
const DOWNLOAD_ACTION: &str = "actions/download-artifact@v4";

const OUTPUT_ARTIFACT: &str = "safe_output.jsonl";
const PATCH_ARTIFACT: &str = "aw.patch";
const PATCH_PATH: &str = "/tmp/aw.patch";

const AGENT_OUTPUT: &str = "${{ needs.agent.outputs.output }}";
const GITHUB_TOKEN: &str = "${{ github.token }}";

/// The gate every other job hangs off.
///
/// With a command trigger the guard requires the command text in the
/// triggering body and the job checks that the actor may run it.
pub fn activation_job(
    user_condition: Option<&str>,
    command: Option<&str>,
    has_other_events: bool,
    runs_on: Value,
) -> Job {
    let user_condition = user_condition.unwrap_or_default();
    let guard = match command {
        Some(command) => {
            merge_condition(user_condition, command_condition(command, has_other_events)).render()
        }
        None => strip_expression_wrapper(user_condition).to_string(),
    };

    let mut job = Job::new(ACTIVATION_JOB).runs_on(runs_on).guard(guard);

    if let Some(command) = command {
        let not_member =
            property_not_equals("steps.check_membership.outputs.is_team_member", "true");
        job = job
            .step(
                Step::run("Check team membership", scripts::CHECK_MEMBERSHIP)
                    .with_id("check_membership")
                    .with_env("GH_TOKEN", GITHUB_TOKEN),
            )
            .step(
                Step::run(
                    "Reject non-members",
                    format!(
                        "echo \"::error::Only collaborators with write access can run /{command}\"\nexit 1"
                    ),
                )
                .when(not_member.render()),
            );
    }

    job.step(
        Step::run("Compute current body text", scripts::COMPUTE_TEXT)
            .with_id("compute_text")
            .with_env("ISSUE_TITLE", "${{ github.event.issue.title }}")
            .with_env("ISSUE_BODY", "${{ github.event.issue.body }}")
            .with_env("PR_TITLE", "${{ github.event.pull_request.title }}")
            .with_env("PR_BODY", "${{ github.event.pull_request.body }}")
            .with_env("COMMENT_BODY", "${{ github.event.comment.body }}"),
    )
    .output("text", "${{ steps.compute_text.outputs.text }}")
}

/// Adds `reaction` to the triggering issue, pull request or comment.
pub fn reaction_job(reaction: &str, runs_on: Value) -> Job {
    let guard = any_event(COMMENT_EVENTS.iter().map(|(event, _)| *event));

    Job::new(REACTION_JOB)
        .needs(ACTIVATION_JOB)
        .guard(guard.render())
        .runs_on(runs_on)
        .permissions(JobPermissions::scopes([
            ("issues", "write"),
            ("pull-requests", "write"),
        ]))
        .step(
            Step::run("Add reaction", scripts::ADD_REACTION)
                .with_id("react")
                .with_env("GH_TOKEN", GITHUB_TOKEN)
                .with_env("REACTION", reaction)
                .with_env("ISSUE_NUMBER", "${{ github.event.issue.number }}")
                .with_env("PR_NUMBER", "${{ github.event.pull_request.number }}")
                .with_env("COMMENT_ID", "${{ github.event.comment.id }}"),
        )
        .output("reaction_id", "${{ steps.react.outputs.reaction_id }}")
}

/// Inputs of the agent job.
#[derive(Debug, Clone)]
pub struct AgentJob<'a> {
    pub runs_on: Value,
    pub permissions: JobPermissions,
    pub prompt: &'a str,
    /// Rendered MCP configuration document, when MCP servers are configured.
    pub mcp_config: Option<&'a str>,
    pub engine: EngineRun<'a>,
    pub side_effects: Option<&'a SafeOutputsConfig>,
}

impl AgentJob<'_> {
    pub fn build(&self) -> Job {
        let mut job = Job::new(AGENT_JOB)
            .needs(ACTIVATION_JOB)
            .runs_on(self.runs_on.clone())
            .permissions(self.permissions.clone())
            .timeout_minutes(self.engine.timeout_minutes)
            .step(Step::uses("Checkout repository", CHECKOUT_ACTION));

        if let Some(config) = self.mcp_config {
            job = job.step(Step::run(
                "Setup MCP servers",
                heredoc(MCP_CONFIG_PATH, "AW_MCP_EOF", config),
            ));
        }

        job = job.step(Step::run("Create prompt", self.prompt_script()));
        for step in engine::engine_steps(&self.engine) {
            job = job.step(step);
        }

        let Some(side_effects) = self.side_effects else {
            return job;
        };

        job = job
            .step(
                Step::run("Collect agent output", scripts::COLLECT_OUTPUT)
                    .with_id("collect_output")
                    .with_env(SAFE_OUTPUTS_ENV, SAFE_OUTPUTS_PATH),
            )
            .step(upload("Upload agent output", OUTPUT_ARTIFACT, SAFE_OUTPUTS_PATH))
            .output("output", "${{ steps.collect_output.outputs.output }}");

        if side_effects.needs_write_access() {
            job = job
                .step(Step::run("Generate git patch", scripts::GENERATE_PATCH).when("always()"))
                .step(upload("Upload git patch", PATCH_ARTIFACT, PATCH_PATH));
        }
        job
    }

    fn prompt_script(&self) -> String {
        let mut prompt = self.prompt.trim_end().to_string();
        if let Some(side_effects) = self.side_effects {
            prompt.push_str("\n\n");
            prompt.push_str(&safe_output_instructions(side_effects));
        }

        let mut script = heredoc(PROMPT_PATH, "AW_PROMPT_EOF", &prompt);
        if self.side_effects.is_some() {
            script = format!(
                "mkdir -p {dir}\ntouch {SAFE_OUTPUTS_PATH}\n{script}",
                dir = parent_dir(SAFE_OUTPUTS_PATH)
            );
        }
        script
    }
}

/// Instructions appended to the prompt describing how to request each
/// enabled side effect.
pub fn safe_output_instructions(config: &SafeOutputsConfig) -> String {
    let mut text = format!(
        "---\n\n## Reporting results\n\n\
Do not change anything on GitHub directly. Request each action by appending one JSON \
object per line to the file named by the {SAFE_OUTPUTS_ENV} environment variable.\n"
    );

    let comment_target = config
        .add_issue_comment
        .as_ref()
        .and_then(|c| c.target.as_deref());
    for kind in config.requested() {
        let example = match kind {
            SafeOutputKind::CreateIssue => r#"{"type": "create-issue", "title": "...", "body": "..."}"#,
            SafeOutputKind::AddIssueComment => {
                if is_wildcard(comment_target) {
                    r#"{"type": "add-issue-comment", "issue_number": 1, "body": "..."}"#
                } else {
                    r#"{"type": "add-issue-comment", "body": "..."}"#
                }
            }
            SafeOutputKind::CreatePullRequest => {
                r#"{"type": "create-pull-request", "title": "...", "body": "..."} after committing your changes with git"#
            }
            SafeOutputKind::PushToPrBranch => {
                r#"{"type": "push-to-pr-branch", "message": "..."} after committing your changes with git"#
            }
            SafeOutputKind::AddIssueLabels => r#"{"type": "add-issue-labels", "labels": ["..."]}"#,
        };
        text.push_str(&format!("\n- {example}"));
    }
    text
}

/// The job realizing one requested side effect.
pub fn side_effect_job(kind: SafeOutputKind, config: &SafeOutputsConfig, runs_on: Value) -> Job {
    let job = Job::new(kind.job_name()).needs(AGENT_JOB).runs_on(runs_on);

    match kind {
        SafeOutputKind::CreateIssue => {
            let issue = config.create_issue.clone().unwrap_or_default();
            job.permissions(JobPermissions::scopes([
                ("contents", "read"),
                ("issues", "write"),
            ]))
            .step(
                effect_step("Create issues", scripts::CREATE_ISSUE)
                    .with_env("TITLE_PREFIX", issue.title_prefix.unwrap_or_default())
                    .with_env("LABELS", issue.labels.join(","))
                    .with_env("MAX_ITEMS", issue.max.unwrap_or(1).to_string()),
            )
        }
        SafeOutputKind::AddIssueComment => {
            let comment = config.add_issue_comment.clone().unwrap_or_default();
            let target = comment.target.as_deref();
            let number = match target {
                None => "${{ github.event.issue.number || github.event.pull_request.number }}",
                Some(target) if is_wildcard(Some(target)) => "",
                Some(number) => number,
            };
            job.guard(triggering_item_guard(target).map(|g| g.render()).unwrap_or_default())
                .permissions(JobPermissions::scopes([
                    ("issues", "write"),
                    ("pull-requests", "write"),
                ]))
                .step(
                    effect_step("Add issue comments", scripts::ADD_COMMENT)
                        .with_env("TARGET_NUMBER", number)
                        .with_env("MAX_ITEMS", comment.max.unwrap_or(1).to_string()),
                )
        }
        SafeOutputKind::CreatePullRequest => {
            let pull = config.create_pull_request.clone().unwrap_or_default();
            job.permissions(JobPermissions::scopes([
                ("contents", "write"),
                ("pull-requests", "write"),
            ]))
            .step(Step::uses("Checkout repository", CHECKOUT_ACTION))
            .step(download_patch())
            .step(
                effect_step("Create pull request", scripts::CREATE_PULL_REQUEST)
                    .with_env("TITLE_PREFIX", pull.title_prefix.unwrap_or_default())
                    .with_env("LABELS", pull.labels.join(","))
                    .with_env("DRAFT", pull.draft.to_string()),
            )
        }
        SafeOutputKind::PushToPrBranch => {
            let push = config.push_to_pr_branch.clone().unwrap_or_default();
            let target = push.target.as_deref();
            let number = match target {
                None => "${{ github.event.pull_request.number || github.event.issue.number }}",
                Some(target) if is_wildcard(Some(target)) => "",
                Some(number) => number,
            };
            job.guard(pull_request_guard(target).map(|g| g.render()).unwrap_or_default())
                .permissions(JobPermissions::scopes([
                    ("contents", "write"),
                    ("pull-requests", "read"),
                ]))
                .step(
                    Step::uses("Checkout repository", CHECKOUT_ACTION)
                        .with_input("fetch-depth", "0"),
                )
                .step(download_patch())
                .step(
                    effect_step("Push to pull request branch", scripts::PUSH_TO_BRANCH)
                        .with_env("PR_NUMBER", number),
                )
        }
        SafeOutputKind::AddIssueLabels => {
            let labels = config.add_issue_labels.clone().unwrap_or_default();
            job.guard(triggering_item_guard(None).map(|g| g.render()).unwrap_or_default())
                .permissions(JobPermissions::scopes([
                    ("issues", "write"),
                    ("pull-requests", "write"),
                ]))
                .step(
                    effect_step("Add labels", scripts::ADD_LABELS)
                        .with_env(
                            "NUMBER",
                            "${{ github.event.issue.number || github.event.pull_request.number }}",
                        )
                        .with_env("ALLOWED_LABELS", labels.allowed.join(","))
                        .with_env("MAX_ITEMS", labels.max.unwrap_or(3).to_string()),
                )
        }
    }
}

/// Restricts a job to events that carry an issue or pull request, unless
/// an explicit target makes the triggering item irrelevant.
fn triggering_item_guard(target: Option<&str>) -> Option<ConditionNode> {
    target
        .is_none()
        .then(|| any_event(COMMENT_EVENTS.iter().map(|(event, _)| *event)))
}

/// Restricts a job to events that carry a pull request, unless an explicit
/// target is configured.
fn pull_request_guard(target: Option<&str>) -> Option<ConditionNode> {
    target.is_none().then(|| {
        ConditionNode::disjunction(vec![
            event_is("pull_request"),
            event_is("pull_request_review_comment"),
            event_is("issue_comment")
                .and(ConditionNode::property("github.event.issue.pull_request")),
        ])
    })
}

fn is_wildcard(target: Option<&str>) -> bool {
    target == Some(awc_core::tools::WILDCARD)
}

fn effect_step(name: &str, script: &str) -> Step {
    Step::run(name, script)
        .with_env("GH_TOKEN", GITHUB_TOKEN)
        .with_env("AGENT_OUTPUT", AGENT_OUTPUT)
}

fn upload(name: &str, artifact: &str, path: &str) -> Step {
    Step::uses(name, UPLOAD_ACTION)
        .when("always()")
        .with_input("name", artifact)
        .with_input("path", path)
        .with_input("if-no-files-found", "warn")
}

fn download_patch() -> Step {
    Step::uses("Download git patch", DOWNLOAD_ACTION)
        .with_input("name", PATCH_ARTIFACT)
        .with_input("path", parent_dir(PATCH_PATH))
}

fn heredoc(path: &str, delimiter: &str, content: &str) -> String {
    format!(
        "mkdir -p {dir}\ncat > {path} << '{delimiter}'\n{content}\n{delimiter}",
        dir = parent_dir(path)
    )
}

fn parent_dir(path: &str) -> &str {
    path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(".")
}

#[cfg(test)]
mod tests {
    use super::*;
    use awc_core::safe_outputs::{AddIssueCommentConfig, PushToBranchConfig};
    use awc_core::workflow::{EngineConfig, EngineKind};
    use pretty_assertions::assert_eq;

    fn runner() -> Value {
        Value::from("ubuntu-latest")
    }

    #[test]
    fn test_activation_without_command_uses_user_guard() {
        let job = activation_job(Some("${{ github.actor != 'bot' }}"), None, false, runner());
        assert_eq!(job.guard.as_deref(), Some("github.actor != 'bot'"));
        assert_eq!(job.steps.len(), 1);
        assert!(job.outputs.contains_key("text"));
    }

    #[test]
    fn test_activation_without_any_guard() {
        let job = activation_job(None, None, false, runner());
        assert!(job.guard.is_none());
    }

    #[test]
    fn test_activation_with_command_merges_guards() {
        let job = activation_job(Some("github.actor != 'bot'"), Some("triage"), false, runner());
        let guard = job.guard.unwrap();
        assert!(guard.starts_with("(github.actor != 'bot') && ("));
        assert!(guard.contains("contains(github.event.comment.body, '/triage')"));
        assert_eq!(job.steps[0].id.as_deref(), Some("check_membership"));
        assert_eq!(
            job.steps[1].condition.as_deref(),
            Some("steps.check_membership.outputs.is_team_member != 'true'")
        );
    }

    #[test]
    fn test_reaction_job() {
        let job = reaction_job("eyes", runner());
        assert!(job.depends_on.contains(ACTIVATION_JOB));
        assert_eq!(
            job.guard.as_deref(),
            Some(
                "github.event_name == 'issues' || github.event_name == 'issue_comment' || \
github.event_name == 'pull_request' || github.event_name == 'pull_request_review_comment'"
            )
        );
        assert_eq!(job.steps[0].env["REACTION"], "eyes");
        assert!(job.outputs.contains_key("reaction_id"));
    }

    #[test]
    fn test_agent_job_without_side_effects() {
        let engine = EngineConfig {
            id: EngineKind::Claude,
            model: None,
            max_turns: None,
        };
        let job = AgentJob {
            runs_on: runner(),
            permissions: JobPermissions::read_all(),
            prompt: "Summarize the issue.\n",
            mcp_config: None,
            engine: EngineRun {
                config: &engine,
                allowed_tools: "Read",
                timeout_minutes: 12,
                has_mcp_servers: false,
                has_side_effects: false,
            },
            side_effects: None,
        }
        .build();

        let names: Vec<&str> = job.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Checkout repository", "Create prompt", "Execute Claude Code Action"]
        );
        assert_eq!(job.timeout_minutes, Some(12));
        assert!(job.outputs.is_empty());
        assert_eq!(
            job.steps[1].run.as_deref(),
            Some("mkdir -p /tmp/aw-prompts\ncat > /tmp/aw-prompts/prompt.txt << 'AW_PROMPT_EOF'\nSummarize the issue.\nAW_PROMPT_EOF")
        );
    }

    #[test]
    fn test_agent_job_with_write_side_effects() {
        let engine = EngineConfig {
            id: EngineKind::Claude,
            model: None,
            max_turns: None,
        };
        let side_effects: SafeOutputsConfig =
            serde_yaml::from_str("create-pull-request:\n").unwrap();
        let job = AgentJob {
            runs_on: runner(),
            permissions: JobPermissions::read_all(),
            prompt: "Fix the typo.",
            mcp_config: Some("{}"),
            engine: EngineRun {
                config: &engine,
                allowed_tools: "Bash",
                timeout_minutes: 15,
                has_mcp_servers: true,
                has_side_effects: true,
            },
            side_effects: Some(&side_effects),
        }
        .build();

        let names: Vec<&str> = job.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Checkout repository",
                "Setup MCP servers",
                "Create prompt",
                "Execute Claude Code Action",
                "Collect agent output",
                "Upload agent output",
                "Generate git patch",
                "Upload git patch",
            ]
        );
        let prompt = job.steps[2].run.as_deref().unwrap();
        assert!(prompt.contains("create-pull-request"));
        assert!(prompt.starts_with("mkdir -p /tmp/aw-safe-outputs\n"));
        assert!(job.outputs.contains_key("output"));
    }

    #[test]
    fn test_side_effect_jobs_need_agent() {
        let config: SafeOutputsConfig = serde_yaml::from_str(
            "create-issue:\nadd-issue-comment:\ncreate-pull-request:\npush-to-pr-branch:\nadd-issue-labels:\n",
        )
        .unwrap();
        for kind in config.requested() {
            let job = side_effect_job(kind, &config, runner());
            assert_eq!(job.name, kind.job_name());
            assert!(job.depends_on.contains(AGENT_JOB));
            assert!(job.permissions.is_some());
        }
    }

    #[test]
    fn test_comment_job_guard_depends_on_target() {
        let mut config = SafeOutputsConfig {
            add_issue_comment: Some(AddIssueCommentConfig::default()),
            ..Default::default()
        };
        let job = side_effect_job(SafeOutputKind::AddIssueComment, &config, runner());
        assert!(job.guard.unwrap().contains("github.event_name == 'issue_comment'"));

        config.add_issue_comment = Some(AddIssueCommentConfig {
            target: Some("*".to_string()),
            max: Some(5),
        });
        let job = side_effect_job(SafeOutputKind::AddIssueComment, &config, runner());
        assert!(job.guard.is_none());
        assert_eq!(job.steps[0].env["TARGET_NUMBER"], "");
        assert_eq!(job.steps[0].env["MAX_ITEMS"], "5");
    }

    #[test]
    fn test_push_job_is_restricted_to_pull_requests() {
        let config = SafeOutputsConfig {
            push_to_pr_branch: Some(PushToBranchConfig::default()),
            ..Default::default()
        };
        let job = side_effect_job(SafeOutputKind::PushToPrBranch, &config, runner());
        assert_eq!(
            job.guard.as_deref(),
            Some(
                "github.event_name == 'pull_request' || github.event_name == 'pull_request_review_comment' || \
(github.event_name == 'issue_comment') && (github.event.issue.pull_request)"
            )
        );
    }

    #[test]
    fn test_safe_output_instructions_follow_request_order() {
        let config: SafeOutputsConfig =
            serde_yaml::from_str("add-issue-labels:\ncreate-issue:\n").unwrap();
        let text = safe_output_instructions(&config);
        let issue = text.find("create-issue").unwrap();
        let labels = text.find("add-issue-labels").unwrap();
        assert!(issue < labels);
        assert!(text.contains(SAFE_OUTPUTS_ENV));
    }
}
