// src/models/stats_models.rs
use serde::{Deserialize, Serialize};

/// Aggregate counters returned by a run for external observability.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub run_id: String,
    pub organizations_processed: usize,
    pub organizations_failed: usize,
    pub candidates_loaded: usize,
    pub candidates_scored: usize,
    pub scores_created: usize,
    pub high_priority_count: usize,
    pub blocked_count: usize,
    pub alerts_generated: usize,
    pub alerts_suppressed: usize,
    pub expired_scores_pruned: u64,
    pub failed_write_batches: usize,
    pub load_time: f64,
    pub evaluation_time: f64,
    pub write_time: f64,
}

/// Result of flushing one output buffer in fixed-size batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub attempted: usize,
    pub written: usize,
    pub failed_batches: usize,
}

impl WriteReport {
    pub fn merge(&mut self, other: WriteReport) {
        self.attempted += other.attempted;
        self.written += other.written;
        self.failed_batches += other.failed_batches;
    }
}
