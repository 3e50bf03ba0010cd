// src/pipeline/mod.rs
pub mod db;
pub mod evaluate;
pub mod run;
pub mod snapshot;

pub use evaluate::{evaluate_snapshot, EvaluationOutput, EvaluationSettings, OrgUsage};
pub use run::{run_relevance, RunOptions};
pub use snapshot::{RunSnapshot, SnapshotInputs};
