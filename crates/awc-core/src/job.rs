//! Job records assembled by the compiler and registered into a job graph.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Token permissions granted to a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum JobPermissions {
    /// A shorthand such as `read-all`.
    Shorthand(String),
    /// Scope to access level, e.g. `issues: write`.
    Scopes(BTreeMap<String, String>),
}

impl JobPermissions {
    pub fn read_all() -> Self {
        Self::Shorthand("read-all".to_string())
    }

    pub fn scopes<I, K, V>(scopes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Scopes(
            scopes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// One step of a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uses: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub with: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<String>,
}

impl Step {
    /// A step running a shell script.
    pub fn run(name: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            run: Some(script.into()),
            ..Default::default()
        }
    }

    /// A step invoking an action.
    pub fn uses(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uses: Some(action.into()),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

/// A single CI job.
///
/// `guard` holds rendered condition text and `permissions` the token scopes;
/// both are opaque to the graph that stores the job.
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    pub name: String,
    pub runs_on: serde_yaml::Value,
    pub guard: Option<String>,
    pub permissions: Option<JobPermissions>,
    pub timeout_minutes: Option<u32>,
    pub steps: Vec<Step>,
    pub outputs: BTreeMap<String, String>,
    pub depends_on: BTreeSet<String>,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            runs_on: serde_yaml::Value::String("ubuntu-latest".to_string()),
            guard: None,
            permissions: None,
            timeout_minutes: None,
            steps: Vec::new(),
            outputs: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn needs(mut self, job: impl Into<String>) -> Self {
        self.depends_on.insert(job.into());
        self
    }

    /// Set the guard; empty text leaves the job unguarded.
    pub fn guard(mut self, condition: impl Into<String>) -> Self {
        let condition = condition.into();
        self.guard = (!condition.is_empty()).then_some(condition);
        self
    }

    pub fn runs_on(mut self, runs_on: serde_yaml::Value) -> Self {
        self.runs_on = runs_on;
        self
    }

    pub fn permissions(mut self, permissions: JobPermissions) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn timeout_minutes(mut self, minutes: u32) -> Self {
        self.timeout_minutes = Some(minutes);
        self
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    pub fn output(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.outputs.insert(name.into(), expression.into());
        self
    }
}
