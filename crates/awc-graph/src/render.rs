//! YAML rendering of the jobs section.

use crate::graph::{GraphError, JobGraph, Result};
use awc_core::job::Job;
use serde_yaml::{Mapping, Value};

impl JobGraph {
    /// The jobs mapping, keyed in insertion order.
    pub fn to_yaml_value(&self) -> Result<Value> {
        let mut jobs = Mapping::new();
        for job in self.jobs() {
            jobs.insert(Value::String(job.name.clone()), job_value(job)?);
        }
        Ok(Value::Mapping(jobs))
    }

    /// Render the `jobs:` section. An empty graph renders `jobs: {}`.
    pub fn render_yaml(&self) -> Result<String> {
        let mut root = Mapping::new();
        root.insert(Value::from("jobs"), self.to_yaml_value()?);
        serde_yaml::to_string(&root).map_err(render_error)
    }
}

fn render_error(err: serde_yaml::Error) -> GraphError {
    GraphError::Render(err.to_string())
}

fn job_value(job: &Job) -> Result<Value> {
    let mut map = Mapping::new();

    let mut needs = job.depends_on.iter().cloned().map(Value::String);
    match job.depends_on.len() {
        0 => {}
        1 => {
            if let Some(single) = needs.next() {
                map.insert(Value::from("needs"), single);
            }
        }
        _ => {
            map.insert(Value::from("needs"), Value::Sequence(needs.collect()));
        }
    }

    if let Some(guard) = &job.guard {
        map.insert(Value::from("if"), Value::String(guard.clone()));
    }
    map.insert(Value::from("runs-on"), job.runs_on.clone());
    if let Some(permissions) = &job.permissions {
        map.insert(
            Value::from("permissions"),
            serde_yaml::to_value(permissions).map_err(render_error)?,
        );
    }
    if let Some(minutes) = job.timeout_minutes {
        map.insert(Value::from("timeout-minutes"), Value::from(minutes));
    }
    if !job.outputs.is_empty() {
        let outputs = job
            .outputs
            .iter()
            .map(|(name, expression)| {
                (
                    Value::String(name.clone()),
                    Value::String(expression.clone()),
                )
            })
            .collect();
        map.insert(Value::from("outputs"), Value::Mapping(outputs));
    }
    if !job.steps.is_empty() {
        map.insert(
            Value::from("steps"),
            serde_yaml::to_value(&job.steps).map_err(render_error)?,
        );
    }

    Ok(Value::Mapping(map))
}
