use crate::dag::Dag;
use crate::error::DagError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Receives DAG declarations from the hosting process.
///
/// Nothing is discovered implicitly: a DAG is known to an orchestrator only
/// after it was passed to [`register`](Orchestrator::register).
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Registers a DAG. Ids are unique per orchestrator.
    ///
    /// # Errors
    /// [`DagError::DuplicateDagId`] if a DAG with the same id is already registered.
    async fn register(&self, dag: Dag) -> Result<(), DagError>;

    async fn get(&self, dag_id: &str) -> Option<Dag>;

    /// Registered ids in sorted order.
    async fn dag_ids(&self) -> Vec<String>;
}

/// Keeps registered DAGs in memory.
#[derive(Debug, Default)]
pub struct InMemoryOrchestrator {
    dags: RwLock<BTreeMap<String, Dag>>,
}

impl InMemoryOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Orchestrator for InMemoryOrchestrator {
    async fn register(&self, dag: Dag) -> Result<(), DagError> {
        let mut dags = self.dags.write().await;
        if dags.contains_key(dag.dag_id()) {
            debug!(dag_id = dag.dag_id(), "rejecting duplicate registration");
            return Err(DagError::DuplicateDagId(dag.dag_id().to_string()));
        }

        info!(
            dag_id = dag.dag_id(),
            tasks = dag.tasks().len(),
            catchup = dag.schedule().catchup(),
            "registered dag"
        );
        dags.insert(dag.dag_id().to_string(), dag);
        Ok(())
    }

    async fn get(&self, dag_id: &str) -> Option<Dag> {
        self.dags.read().await.get(dag_id).cloned()
    }

    async fn dag_ids(&self) -> Vec<String> {
        self.dags.read().await.keys().cloned().collect()
    }
}
