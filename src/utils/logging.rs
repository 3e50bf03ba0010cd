// src/utils/logging.rs - Phase and summary logging for a relevance run
use log::{info, warn};
use std::time::Instant;

use crate::models::stats_models::{RunStats, WriteReport};

const PREFIX: &str = "RELEVANCE";

#[derive(Clone)]
pub struct RunLogger {
    run_id: String,
    start_time: Instant,
}

impl RunLogger {
    pub fn new(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn log_start(&self, scoped_orgs: Option<usize>, dry_run: bool) {
        let scope = match scoped_orgs {
            Some(n) => format!("{} selected organizations", n),
            None => "all active organizations".to_string(),
        };
        info!(
            "[{}] 🚀 Starting relevance run {} over {}{}",
            PREFIX,
            self.run_id,
            scope,
            if dry_run { " (dry run, no writes)" } else { "" }
        );
    }

    pub fn log_phase(&self, phase: &str, details: Option<&str>) {
        let elapsed = self.start_time.elapsed();
        match details {
            Some(details) => info!(
                "[{}] 🔄 Phase: {} - {} [+{:.1}s]",
                PREFIX,
                phase,
                details,
                elapsed.as_secs_f32()
            ),
            None => info!(
                "[{}] 🔄 Phase: {} [+{:.1}s]",
                PREFIX,
                phase,
                elapsed.as_secs_f32()
            ),
        }
    }

    pub fn log_data_loaded(&self, count: usize, data_type: &str) {
        info!("[{}] 📊 Loaded {} {} records", PREFIX, count, data_type);
    }

    pub fn log_configuration_missing(&self, organization_id: &str) {
        info!(
            "[{}] ℹ️  Organization {} has no profile or interest topics; scoring on entity rules and embeddings only",
            PREFIX, organization_id
        );
    }

    pub fn log_write(&self, table: &str, report: &WriteReport) {
        if report.failed_batches > 0 {
            warn!(
                "[{}] ⚠️  {}: wrote {}/{} rows, {} failed batches",
                PREFIX, table, report.written, report.attempted, report.failed_batches
            );
        } else {
            info!(
                "[{}] 💾 {}: wrote {}/{} rows",
                PREFIX, table, report.written, report.attempted
            );
        }
    }

    pub fn log_warning(&self, message: &str) {
        warn!("[{}] ⚠️  {}", PREFIX, message);
    }

    pub fn log_summary(&self, stats: &RunStats) {
        info!(
            "[{}] 🎉 COMPLETED run {} in {:.2?}",
            PREFIX,
            self.run_id,
            self.start_time.elapsed()
        );
        info!(
            "[{}] 📊 {} organizations x {} candidates: {} scores created ({} high priority, {} blocked)",
            PREFIX,
            stats.organizations_processed,
            stats.candidates_scored,
            stats.scores_created,
            stats.high_priority_count,
            stats.blocked_count
        );
        info!(
            "[{}] 🔔 Alerts: {} generated, {} suppressed as duplicates; {} expired scores pruned",
            PREFIX, stats.alerts_generated, stats.alerts_suppressed, stats.expired_scores_pruned
        );
        info!(
            "[{}] ⏱️  Timing: load {:.2}s, evaluation {:.2}s, writes {:.2}s",
            PREFIX, stats.load_time, stats.evaluation_time, stats.write_time
        );
        if stats.organizations_failed > 0 {
            warn!(
                "[{}] ⚠️  {} organizations failed to score and were skipped",
                PREFIX, stats.organizations_failed
            );
        }
        if stats.failed_write_batches > 0 {
            warn!(
                "[{}] ⚠️  {} write batches failed; counts above reflect rows actually written",
                PREFIX, stats.failed_write_batches
            );
        }
    }
}
