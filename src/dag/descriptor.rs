use super::args::DefaultArgs;
use super::graph::{TaskGraph, TaskSpec};
use super::schedule::Schedule;
use crate::error::DagError;
use serde::Serialize;
use std::fmt;

/// A complete, validated job declaration handed to an orchestrator.
///
/// Fields are private: a `Dag` only comes out of [`DagBuilder::build`] and is
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dag {
    dag_id: String,
    description: Option<String>,
    default_args: DefaultArgs,
    schedule: Schedule,
    tasks: TaskGraph,
}

impl Dag {
    /// Starts declaring a DAG with default arguments and no tasks.
    ///
    /// # Arguments
    /// * `dag_id`: Unique name of the DAG within an orchestrator
    /// * `schedule`: When the DAG runs
    pub fn builder(dag_id: impl Into<String>, schedule: Schedule) -> DagBuilder {
        DagBuilder::new(dag_id, schedule)
    }

    pub fn dag_id(&self) -> &str {
        &self.dag_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn default_args(&self) -> &DefaultArgs {
        &self.default_args
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn tasks(&self) -> &TaskGraph {
        &self.tasks
    }

    /// Default arguments merged with the task's own overrides.
    ///
    /// # Errors
    /// [`DagError::UnknownTask`] if no task has this id.
    pub fn effective_args(&self, task_id: &str) -> Result<DefaultArgs, DagError> {
        let task = self
            .tasks
            .get(task_id)
            .ok_or_else(|| DagError::UnknownTask(task_id.to_string()))?;
        Ok(self.default_args.apply(&task.overrides))
    }
}

impl fmt::Display for Dag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (owner={}, every {}s from {}, catchup={}, retries={}, tasks={})",
            self.dag_id,
            self.default_args.owner,
            self.schedule.interval().num_seconds(),
            self.schedule.start_date().to_rfc3339(),
            self.schedule.catchup(),
            self.default_args.retries,
            self.tasks.len()
        )
    }
}

/// Collects the parts of a [`Dag`] and checks them on [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct DagBuilder {
    dag_id: String,
    description: Option<String>,
    default_args: DefaultArgs,
    schedule: Schedule,
    tasks: Vec<TaskSpec>,
    edges: Vec<(String, String)>,
}

impl DagBuilder {
    pub fn new(dag_id: impl Into<String>, schedule: Schedule) -> Self {
        Self {
            dag_id: dag_id.into(),
            description: None,
            default_args: DefaultArgs::default(),
            schedule,
            tasks: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_args(mut self, default_args: DefaultArgs) -> Self {
        self.default_args = default_args;
        self
    }

    /// Adds a task. Tasks are checked in declaration order on `build`.
    pub fn task(mut self, task: TaskSpec) -> Self {
        self.tasks.push(task);
        self
    }

    /// Makes `downstream` run after `upstream`. Both must be declared with
    /// [`task`](Self::task).
    pub fn edge(mut self, upstream: impl Into<String>, downstream: impl Into<String>) -> Self {
        self.edges.push((upstream.into(), downstream.into()));
        self
    }

    /// Validates everything and produces the read-only [`Dag`].
    ///
    /// # Errors
    /// * [`DagError::InvalidDagId`] if the id is empty or has characters other
    ///   than ASCII letters, digits, `_`, `-` and `.`
    /// * [`DagError::EmptyOwner`] or [`DagError::NegativeRetryDelay`] from the default arguments
    /// * any [`TaskGraph::add_task`] or [`TaskGraph::set_downstream`] error
    pub fn build(self) -> Result<Dag, DagError> {
        if !is_valid_dag_id(&self.dag_id) {
            return Err(DagError::InvalidDagId(self.dag_id));
        }
        self.default_args.validate()?;

        let mut graph = TaskGraph::new();
        for task in self.tasks {
            graph.add_task(task)?;
        }
        for (upstream, downstream) in &self.edges {
            graph.set_downstream(upstream, downstream)?;
        }

        Ok(Dag {
            dag_id: self.dag_id,
            description: self.description,
            default_args: self.default_args,
            schedule: self.schedule,
            tasks: graph,
        })
    }
}

fn is_valid_dag_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}
