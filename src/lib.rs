//! Declaration of the daily stock market ETL job and the pieces needed to
//! describe a DAG: default task arguments, a schedule with a catch-up
//! policy, a task graph, and an explicit registry to hand DAGs to.

pub mod config;
pub mod dag;
pub mod error;
pub mod pipelines;
pub mod registry;

pub use dag::{
    Dag, DagBuilder, DataInterval, DefaultArgs, Schedule, TaskGraph, TaskOverrides, TaskSpec,
};
pub use error::DagError;
pub use registry::{InMemoryOrchestrator, Orchestrator};
