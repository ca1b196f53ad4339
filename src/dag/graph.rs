use super::args::TaskOverrides;
use crate::error::DagError;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};

/// A task declared in a DAG. What the task does is up to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_id: String,
    #[serde(default)]
    pub overrides: TaskOverrides,
}

impl TaskSpec {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            overrides: TaskOverrides::default(),
        }
    }

    pub fn with_overrides(mut self, overrides: TaskOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Tasks and the ordering edges between them. Stays acyclic: an edge that
/// would close a cycle is refused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskGraph {
    tasks: Vec<TaskSpec>,
    index: HashMap<String, usize>,
    downstream: Vec<Vec<usize>>,
    upstream: Vec<Vec<usize>>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[TaskSpec] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&TaskSpec> {
        self.index.get(task_id).map(|&i| &self.tasks[i])
    }

    /// Declares a task with no edges yet.
    ///
    /// # Errors
    /// * [`DagError::EmptyTaskId`] if the id is empty or only whitespace
    /// * [`DagError::InvalidTaskId`] if the id starts or ends with whitespace
    /// * [`DagError::DuplicateTask`] if a task with the same id exists
    /// * [`DagError::NegativeRetryDelay`] if the task overrides the delay with a negative one
    pub fn add_task(&mut self, task: TaskSpec) -> Result<(), DagError> {
        if task.task_id.trim().is_empty() {
            return Err(DagError::EmptyTaskId);
        }
        if task.task_id.trim() != task.task_id {
            return Err(DagError::InvalidTaskId(task.task_id));
        }
        if self.index.contains_key(&task.task_id) {
            return Err(DagError::DuplicateTask(task.task_id));
        }
        task.overrides.validate()?;

        self.index.insert(task.task_id.clone(), self.tasks.len());
        self.tasks.push(task);
        self.downstream.push(Vec::new());
        self.upstream.push(Vec::new());
        Ok(())
    }

    /// Declares that `downstream` runs after `upstream`. Declaring the same
    /// edge again is a no-op.
    ///
    /// # Errors
    /// * [`DagError::UnknownTask`] if either id was not added
    /// * [`DagError::Cycle`] if `upstream` is `downstream` or already runs after it
    pub fn set_downstream(&mut self, upstream: &str, downstream: &str) -> Result<(), DagError> {
        let up = self.position(upstream)?;
        let down = self.position(downstream)?;

        if self.downstream[up].contains(&down) {
            return Ok(());
        }
        if up == down || self.reaches(down, up) {
            return Err(DagError::Cycle {
                upstream: upstream.to_string(),
                downstream: downstream.to_string(),
            });
        }

        self.downstream[up].push(down);
        self.upstream[down].push(up);
        Ok(())
    }

    /// Tasks that must finish before `task_id`.
    ///
    /// # Errors
    /// [`DagError::UnknownTask`] if `task_id` was not added.
    pub fn upstream_of(&self, task_id: &str) -> Result<Vec<&str>, DagError> {
        let i = self.position(task_id)?;
        Ok(self.names(&self.upstream[i]))
    }

    /// Tasks that wait for `task_id`.
    ///
    /// # Errors
    /// [`DagError::UnknownTask`] if `task_id` was not added.
    pub fn downstream_of(&self, task_id: &str) -> Result<Vec<&str>, DagError> {
        let i = self.position(task_id)?;
        Ok(self.names(&self.downstream[i]))
    }

    /// Every task after all of its upstream tasks. Ties go to the task
    /// declared first, so the order is stable across calls.
    pub fn topological_order(&self) -> Vec<&str> {
        let mut in_degree: Vec<usize> = self.upstream.iter().map(Vec::len).collect();
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(self.tasks.len());
        while let Some(i) = ready.pop_first() {
            order.push(self.tasks[i].task_id.as_str());
            for &next in &self.downstream[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }
        order
    }

    /// All edges as `(upstream, downstream)` pairs.
    pub fn edges(&self) -> Vec<(&str, &str)> {
        self.downstream
            .iter()
            .enumerate()
            .flat_map(|(up, downs)| {
                downs.iter().map(move |&down| {
                    (
                        self.tasks[up].task_id.as_str(),
                        self.tasks[down].task_id.as_str(),
                    )
                })
            })
            .collect()
    }

    fn position(&self, task_id: &str) -> Result<usize, DagError> {
        self.index
            .get(task_id)
            .copied()
            .ok_or_else(|| DagError::UnknownTask(task_id.to_string()))
    }

    fn names(&self, ids: &[usize]) -> Vec<&str> {
        ids.iter().map(|&i| self.tasks[i].task_id.as_str()).collect()
    }

    fn reaches(&self, from: usize, target: usize) -> bool {
        let mut seen = vec![false; self.tasks.len()];
        let mut stack = vec![from];
        while let Some(i) = stack.pop() {
            if i == target {
                return true;
            }
            if std::mem::replace(&mut seen[i], true) {
                continue;
            }
            stack.extend(self.downstream[i].iter().copied());
        }
        false
    }
}

impl Serialize for TaskGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            tasks: &'a [TaskSpec],
            edges: Vec<(&'a str, &'a str)>,
        }

        View {
            tasks: &self.tasks,
            edges: self.edges(),
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(ids: &[&str]) -> TaskGraph {
        let mut graph = TaskGraph::new();
        for id in ids {
            graph.add_task(TaskSpec::new(*id)).unwrap();
        }
        graph
    }

    #[test]
    fn test_rejects_duplicate_and_empty_ids() {
        let mut g = graph(&["extract"]);
        assert_eq!(
            g.add_task(TaskSpec::new("extract")),
            Err(DagError::DuplicateTask("extract".to_string()))
        );
        assert_eq!(g.add_task(TaskSpec::new("")), Err(DagError::EmptyTaskId));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_padded_id_rejected() {
        let mut g = graph(&["extract"]);
        assert_eq!(
            g.add_task(TaskSpec::new(" extract ")),
            Err(DagError::InvalidTaskId(" extract ".to_string()))
        );
        assert_eq!(
            g.add_task(TaskSpec::new("load\n")),
            Err(DagError::InvalidTaskId("load\n".to_string()))
        );
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_negative_override_delay_rejected() {
        let mut g = TaskGraph::new();
        let task = TaskSpec::new("extract").with_overrides(TaskOverrides {
            retries: None,
            retry_delay: Some(chrono::Duration::seconds(-10)),
        });
        assert_eq!(
            g.add_task(task),
            Err(DagError::NegativeRetryDelay { secs: -10 })
        );
        assert!(g.is_empty());
    }

    #[test]
    fn test_unknown_task_in_edge() {
        let mut g = graph(&["a"]);
        assert_eq!(
            g.set_downstream("a", "b"),
            Err(DagError::UnknownTask("b".to_string()))
        );
    }

    #[test]
    fn test_cycle_rejected() {
        let mut g = graph(&["a", "b", "c"]);
        g.set_downstream("a", "b").unwrap();
        g.set_downstream("b", "c").unwrap();

        assert!(matches!(g.set_downstream("c", "a"), Err(DagError::Cycle { .. })));
        assert!(matches!(g.set_downstream("b", "b"), Err(DagError::Cycle { .. })));
        assert_eq!(g.edges().len(), 2);
    }

    #[test]
    fn test_duplicate_edge_is_noop() {
        let mut g = graph(&["a", "b"]);
        g.set_downstream("a", "b").unwrap();
        g.set_downstream("a", "b").unwrap();
        assert_eq!(g.edges(), vec![("a", "b")]);
        assert_eq!(g.upstream_of("b").unwrap(), vec!["a"]);
        assert_eq!(g.downstream_of("a").unwrap(), vec!["b"]);
    }

    #[test]
    fn test_topological_order_is_stable() {
        let mut g = graph(&["load", "transform", "extract", "report"]);
        g.set_downstream("extract", "transform").unwrap();
        g.set_downstream("transform", "load").unwrap();

        assert_eq!(
            g.topological_order(),
            vec!["extract", "transform", "load", "report"]
        );
    }

    #[test]
    fn test_serializes_tasks_and_edges() {
        let mut g = graph(&["a", "b"]);
        g.set_downstream("a", "b").unwrap();
        let json = serde_json::to_value(&g).unwrap();
        assert_eq!(json["tasks"][0]["task_id"], "a");
        assert_eq!(json["edges"][0], serde_json::json!(["a", "b"]));
    }
}
