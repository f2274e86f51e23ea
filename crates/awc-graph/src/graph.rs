//! Dependency graph of compiled jobs.

use awc_core::job::Job;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Job name must not be empty")]
    EmptyName,
    #[error("Duplicate job: {0}")]
    DuplicateJob(String),
    #[error("Job '{job}' depends on unknown job '{dependency}'")]
    UnknownDependency { job: String, dependency: String },
    #[error("Cycle detected: job '{job}' depends on '{dependency}'")]
    CycleDetected { job: String, dependency: String },
    #[error("Render failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Clone, Copy, PartialEq, Eq)]
enum VisitState {
    InProgress,
    Done,
}

/// Add-only collection of jobs keyed by name.
///
/// Rendering follows insertion order; execution order lives entirely in each
/// job's `depends_on` set.
#[derive(Debug, Default)]
pub struct JobGraph {
    jobs: HashMap<String, Job>,
    order: Vec<String>,
}

impl JobGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job. Names must be non-blank and unique.
    pub fn add_job(&mut self, job: Job) -> Result<()> {
        if job.name.trim().is_empty() {
            return Err(GraphError::EmptyName);
        }
        if self.jobs.contains_key(&job.name) {
            return Err(GraphError::DuplicateJob(job.name));
        }

        debug!(job = %job.name, needs = job.depends_on.len(), "Registered job");
        self.order.push(job.name.clone());
        self.jobs.insert(job.name.clone(), job);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.jobs.contains_key(name)
    }

    /// Jobs in insertion order.
    pub fn jobs(&self) -> impl Iterator<Item = &Job> {
        self.order.iter().filter_map(|name| self.jobs.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Check that every dependency resolves and that the graph is acyclic.
    pub fn validate_dependencies(&self) -> Result<()> {
        for job in self.jobs() {
            for dependency in &job.depends_on {
                if !self.jobs.contains_key(dependency) {
                    return Err(GraphError::UnknownDependency {
                        job: job.name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }

        let mut states: HashMap<&str, VisitState> = HashMap::new();
        for name in self.sorted_names() {
            if !states.contains_key(name) {
                self.visit(name, &mut states)?;
            }
        }
        Ok(())
    }

    fn visit<'a>(&'a self, name: &'a str, states: &mut HashMap<&'a str, VisitState>) -> Result<()> {
        states.insert(name, VisitState::InProgress);

        if let Some(job) = self.jobs.get(name) {
            for dependency in &job.depends_on {
                match states.get(dependency.as_str()) {
                    Some(VisitState::InProgress) => {
                        return Err(GraphError::CycleDetected {
                            job: name.to_string(),
                            dependency: dependency.clone(),
                        });
                    }
                    Some(VisitState::Done) => {}
                    None => self.visit(dependency, states)?,
                }
            }
        }

        states.insert(name, VisitState::Done);
        Ok(())
    }

    /// Execution order: Kahn's algorithm with an alphabetical tie-break at
    /// every step, so the same graph always yields the same order.
    pub fn topological_order(&self) -> Result<Vec<String>> {
        self.validate_dependencies()?;

        let mut in_degree: BTreeMap<&str, usize> = BTreeMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();
        for job in self.jobs.values() {
            in_degree.insert(&job.name, job.depends_on.len());
            for dependency in &job.depends_on {
                dependents.entry(dependency).or_default().push(&job.name);
            }
        }

        let mut ready: Vec<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(name, _)| *name)
            .collect();
        let mut result = Vec::with_capacity(self.jobs.len());

        while !ready.is_empty() {
            ready.sort_unstable();
            let name = ready.remove(0);
            result.push(name.to_string());

            for dependent in dependents.get(name).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push(dependent);
                    }
                }
            }
        }

        Ok(result)
    }

    fn sorted_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.order.iter().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
