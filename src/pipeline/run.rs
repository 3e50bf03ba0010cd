// src/pipeline/run.rs - One bounded relevance run: load, evaluate, flush
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::alerts::classify::AlertPolicy;
use crate::alerts::db::{insert_alerts, ALERTS_TABLE};
use crate::models::stats_models::{RunStats, WriteReport};
use crate::pipeline::db::{insert_usage_audit, prune_expired_scores, upsert_scores, SCORES_TABLE, USAGE_AUDIT_TABLE};
use crate::pipeline::evaluate::{evaluate_snapshot, EvaluationOutput, EvaluationSettings};
use crate::pipeline::snapshot::RunSnapshot;
use crate::utils::config::RelevanceConfig;
use crate::utils::db_connect::PgPool;
use crate::utils::logging::RunLogger;
use crate::utils::progress_config::ProgressConfig;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Restrict a manual run to these organizations.
    pub organization_ids: Option<Vec<String>>,
    /// Evaluate and report without writing anything.
    pub dry_run: bool,
}

/// Runs the full sweep and returns the aggregate counters. Only failures to
/// read reference data are returned as errors; write failures are counted.
pub async fn run_relevance(
    pool: &PgPool,
    config: &RelevanceConfig,
    options: &RunOptions,
    progress_config: &ProgressConfig,
) -> Result<RunStats> {
    let run_id = Uuid::new_v4().to_string();
    let logger = RunLogger::new(&run_id);
    let now = Utc::now();
    let scope = options.organization_ids.as_deref();
    logger.log_start(scope.map(|ids| ids.len()), options.dry_run);

    let weights = config
        .scoring_weights()
        .context("Failed to load scoring weights")?;

    logger.log_phase("Loading reference data", None);
    let load_start = Instant::now();
    let snapshot = RunSnapshot::load(pool, config, scope, now, &logger).await?;
    let load_time = load_start.elapsed().as_secs_f64();
    let organizations = snapshot.organizations.len();
    let candidates = snapshot.candidates.len();

    logger.log_phase(
        "Scoring",
        Some(&format!("{} organizations x {} candidates", organizations, candidates)),
    );
    let eval_start = Instant::now();
    let settings = EvaluationSettings {
        max_concurrent_orgs: config.max_concurrent_orgs,
        score_ttl: config.score_ttl(),
        dedup_window: config.dedup_window(),
        ..Default::default()
    };
    let progress = progress_config.org_progress_bar(organizations as u64);
    let output = evaluate_snapshot(
        Arc::new(snapshot),
        Arc::new(weights),
        &AlertPolicy::default(),
        &settings,
        &progress,
        now,
    )
    .await?;
    progress.finish_and_clear();
    let evaluation_time = eval_start.elapsed().as_secs_f64();

    let write_start = Instant::now();
    let mut stats = if options.dry_run {
        logger.log_phase("Dry run", Some("skipping writes"));
        build_stats(&run_id, organizations, candidates, &output, None)
    } else {
        logger.log_phase("Writing results", None);
        let batch_size = config.write_batch_size;
        let score_report = upsert_scores(pool, &output.scores, batch_size).await;
        logger.log_write(SCORES_TABLE, &score_report);
        let alert_report = insert_alerts(pool, &output.alerts, batch_size).await;
        logger.log_write(ALERTS_TABLE, &alert_report);
        let usage_report = insert_usage_audit(pool, &run_id, &output.usage, now, batch_size).await;
        logger.log_write(USAGE_AUDIT_TABLE, &usage_report);

        let mut stats = build_stats(
            &run_id,
            organizations,
            candidates,
            &output,
            Some((score_report, alert_report, usage_report)),
        );
        match prune_expired_scores(pool, now).await {
            Ok(pruned) => stats.expired_scores_pruned = pruned,
            Err(e) => logger.log_warning(&format!("Pruning expired scores failed: {:#}", e)),
        }
        stats
    };

    stats.load_time = load_time;
    stats.evaluation_time = evaluation_time;
    stats.write_time = write_start.elapsed().as_secs_f64();
    logger.log_summary(&stats);
    Ok(stats)
}

/// Counters for the run. With write reports, created counts are what was
/// actually written; without (dry run), what would have been.
fn build_stats(
    run_id: &str,
    organizations: usize,
    candidates: usize,
    output: &EvaluationOutput,
    writes: Option<(WriteReport, WriteReport, WriteReport)>,
) -> RunStats {
    let (scores_created, alerts_generated, failed_write_batches) = match writes {
        Some((scores, alerts, usage)) => (
            scores.written,
            alerts.written,
            scores.failed_batches + alerts.failed_batches + usage.failed_batches,
        ),
        None => (output.scores.len(), output.alerts.len(), 0),
    };
    RunStats {
        run_id: run_id.to_string(),
        organizations_processed: organizations.saturating_sub(output.failed_organizations.len()),
        organizations_failed: output.failed_organizations.len(),
        candidates_loaded: candidates,
        candidates_scored: output.pairs_scored,
        scores_created,
        high_priority_count: output.high_priority_count(),
        blocked_count: output.blocked_count(),
        alerts_generated,
        alerts_suppressed: output.alerts_suppressed,
        failed_write_batches,
        ..Default::default()
    }
}
