//! Safe output (side-effect request) configuration.
//!
//! The agent never writes to the repository directly. It records the side
//! effects it wants in a structured output file and dedicated downstream jobs
//! realize them with their own narrowly scoped permissions.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Side effects requested by a workflow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct SafeOutputsConfig {
    #[serde(default, deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<CreateIssueConfig>")]
    pub create_issue: Option<CreateIssueConfig>,
    #[serde(default, deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<AddIssueCommentConfig>")]
    pub add_issue_comment: Option<AddIssueCommentConfig>,
    #[serde(default, deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<CreatePullRequestConfig>")]
    pub create_pull_request: Option<CreatePullRequestConfig>,
    #[serde(default, deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<PushToBranchConfig>")]
    pub push_to_pr_branch: Option<PushToBranchConfig>,
    #[serde(default, deserialize_with = "enabled", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<AddIssueLabelsConfig>")]
    pub add_issue_labels: Option<AddIssueLabelsConfig>,
}

/// A key that is present with a null value enables the output with defaults.
fn enabled<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Some(Option::<T>::deserialize(deserializer)?.unwrap_or_default()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct CreateIssueConfig {
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct AddIssueCommentConfig {
    /// `"*"` allows commenting on any issue named in the output.
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub max: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct CreatePullRequestConfig {
    #[serde(default)]
    pub title_prefix: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default = "default_true")]
    pub draft: bool,
}

impl Default for CreatePullRequestConfig {
    fn default() -> Self {
        Self {
            title_prefix: None,
            labels: vec![],
            draft: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct PushToBranchConfig {
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub struct AddIssueLabelsConfig {
    /// Labels the agent may apply. Empty means any label.
    #[serde(default)]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub max: Option<u32>,
}

/// One kind of side effect, in the order realization jobs are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SafeOutputKind {
    CreateIssue,
    AddIssueComment,
    CreatePullRequest,
    PushToPrBranch,
    AddIssueLabels,
}

impl SafeOutputKind {
    /// Name of the job that realizes this side effect.
    pub fn job_name(&self) -> &'static str {
        match self {
            Self::CreateIssue => "create_issue",
            Self::AddIssueComment => "create_issue_comment",
            Self::CreatePullRequest => "create_pull_request",
            Self::PushToPrBranch => "push_to_pr_branch",
            Self::AddIssueLabels => "add_labels",
        }
    }

    /// Identifier the agent writes into its output file.
    pub fn output_type(&self) -> &'static str {
        match self {
            Self::CreateIssue => "create-issue",
            Self::AddIssueComment => "add-issue-comment",
            Self::CreatePullRequest => "create-pull-request",
            Self::PushToPrBranch => "push-to-pr-branch",
            Self::AddIssueLabels => "add-issue-labels",
        }
    }

    /// Branch creation and direct pushes need the agent to run git locally.
    pub fn needs_write_access(&self) -> bool {
        matches!(self, Self::CreatePullRequest | Self::PushToPrBranch)
    }
}

impl SafeOutputsConfig {
    /// Requested side effects in emission order.
    pub fn requested(&self) -> Vec<SafeOutputKind> {
        let mut kinds = Vec::new();
        if self.create_issue.is_some() {
            kinds.push(SafeOutputKind::CreateIssue);
        }
        if self.add_issue_comment.is_some() {
            kinds.push(SafeOutputKind::AddIssueComment);
        }
        if self.create_pull_request.is_some() {
            kinds.push(SafeOutputKind::CreatePullRequest);
        }
        if self.push_to_pr_branch.is_some() {
            kinds.push(SafeOutputKind::PushToPrBranch);
        }
        if self.add_issue_labels.is_some() {
            kinds.push(SafeOutputKind::AddIssueLabels);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.requested().is_empty()
    }

    pub fn needs_write_access(&self) -> bool {
        self.requested().iter().any(SafeOutputKind::needs_write_access)
    }
}
