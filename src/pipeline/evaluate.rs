// src/pipeline/evaluate.rs - Parallel org x candidate sweep and alert emission
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::ProgressBar;
use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinError;

use crate::alerts::classify::AlertPolicy;
use crate::alerts::dedup::AlertDeduplicator;
use crate::models::alerts::AlertRecord;
use crate::models::core::OrganizationInterests;
use crate::models::scoring::{PriorityBucket, RelevanceScoreRecord};
use crate::pipeline::snapshot::RunSnapshot;
use crate::scoring::engine::ScoringEngine;
use crate::scoring::weights::ScoringWeights;

#[derive(Debug, Clone)]
pub struct EvaluationSettings {
    pub max_concurrent_orgs: usize,
    pub score_ttl: Duration,
    pub dedup_window: Duration,
    pub semantic_enabled: bool,
    pub outcome_boost_enabled: bool,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            max_concurrent_orgs: 4,
            score_ttl: Duration::hours(24),
            dedup_window: Duration::hours(4),
            semantic_enabled: true,
            outcome_boost_enabled: true,
        }
    }
}

/// Per-organization counters, one usage-audit row each.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgUsage {
    pub organization_id: String,
    pub pairs_scored: usize,
    pub scores_created: usize,
    pub alerts_generated: usize,
}

#[derive(Debug, Default)]
pub struct EvaluationOutput {
    /// Persistable records, one per (organization, trend key).
    pub scores: Vec<RelevanceScoreRecord>,
    pub alerts: Vec<AlertRecord>,
    pub usage: Vec<OrgUsage>,
    pub pairs_scored: usize,
    pub alerts_suppressed: usize,
    /// Organizations whose scoring task failed; they contribute nothing.
    pub failed_organizations: Vec<String>,
}

impl EvaluationOutput {
    pub fn high_priority_count(&self) -> usize {
        self.scores
            .iter()
            .filter(|r| r.priority_bucket == PriorityBucket::High)
            .count()
    }

    pub fn blocked_count(&self) -> usize {
        self.scores.iter().filter(|r| r.is_blocked).count()
    }
}

struct OrgEvaluation {
    org_index: usize,
    pairs_scored: usize,
    /// (candidate index, record) for every pair worth persisting.
    records: Vec<(usize, RelevanceScoreRecord)>,
}

/// Scores every organization against every candidate, one task per
/// organization bounded by a semaphore, then emits deduplicated alerts in a
/// fixed order so the output does not depend on task scheduling.
pub async fn evaluate_snapshot(
    snapshot: Arc<RunSnapshot>,
    weights: Arc<ScoringWeights>,
    policy: &AlertPolicy,
    settings: &EvaluationSettings,
    progress: &ProgressBar,
    now: DateTime<Utc>,
) -> Result<EvaluationOutput> {
    let semaphore = Arc::new(Semaphore::new(settings.max_concurrent_orgs.max(1)));
    let tasks = FuturesUnordered::new();

    for org_index in 0..snapshot.organizations.len() {
        let snapshot = Arc::clone(&snapshot);
        let weights = Arc::clone(&weights);
        let semaphore = Arc::clone(&semaphore);
        let settings = settings.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .context("Evaluation semaphore closed")?;
            Ok::<_, anyhow::Error>(score_organization(&snapshot, &weights, &settings, org_index, now))
        });
        tasks.push(async move { (org_index, handle.await) });
    }

    let (evaluations, failed_organizations) =
        collect_evaluations(tasks, &snapshot.organizations, progress).await;

    let mut output = EvaluationOutput {
        failed_organizations,
        ..Default::default()
    };
    let mut usage_index: HashMap<String, usize> = HashMap::new();
    let mut alert_candidates: Vec<AlertRecord> = Vec::new();

    for evaluation in evaluations {
        let org = &snapshot.organizations[evaluation.org_index];
        // Alerts come from every scored pair; the deduplicator, not the
        // per-key collapse below, decides which of them fire.
        for (candidate_index, record) in &evaluation.records {
            let prepared = &snapshot.candidates[*candidate_index];
            if let Some(alert) = policy.build_alert(&org.profile, prepared, record, now) {
                alert_candidates.push(alert);
            }
        }
        let records = collapse_by_trend_key(evaluation.records);

        usage_index.insert(org.organization_id().to_string(), output.usage.len());
        output.usage.push(OrgUsage {
            organization_id: org.organization_id().to_string(),
            pairs_scored: evaluation.pairs_scored,
            scores_created: records.len(),
            alerts_generated: 0,
        });
        output.pairs_scored += evaluation.pairs_scored;
        output.scores.extend(records.into_iter().map(|(_, record)| record));
    }

    alert_candidates.sort_by(|a, b| {
        a.organization_id
            .cmp(&b.organization_id)
            .then_with(|| {
                b.relevance_score
                    .partial_cmp(&a.relevance_score)
                    .unwrap_or(Ordering::Equal)
            })
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    let mut dedup = AlertDeduplicator::new(settings.dedup_window, &snapshot.recent_alerts, now);
    for alert in alert_candidates {
        if let Some(alert) = dedup.admit(alert) {
            if let Some(&i) = usage_index.get(&alert.organization_id) {
                output.usage[i].alerts_generated += 1;
            }
            output.alerts.push(alert);
        }
    }
    output.alerts_suppressed = dedup.suppressed_count();

    debug!(
        "Evaluated {} pairs: {} persistable scores, {} alerts ({} suppressed)",
        output.pairs_scored,
        output.scores.len(),
        output.alerts.len(),
        output.alerts_suppressed
    );
    Ok(output)
}

/// Drains the per-organization tasks. A task that errors or panics is logged
/// and its organization skipped; the others still count.
async fn collect_evaluations<F>(
    mut tasks: FuturesUnordered<F>,
    organizations: &[OrganizationInterests],
    progress: &ProgressBar,
) -> (Vec<OrgEvaluation>, Vec<String>)
where
    F: Future<Output = (usize, Result<Result<OrgEvaluation>, JoinError>)>,
{
    let mut evaluations = Vec::with_capacity(organizations.len());
    let mut failed = Vec::new();

    while let Some((org_index, joined)) = tasks.next().await {
        progress.inc(1);
        let organization_id = organizations
            .get(org_index)
            .map(|org| org.organization_id().to_string())
            .unwrap_or_else(|| format!("#{}", org_index));
        match joined.map_err(anyhow::Error::from).and_then(|result| result) {
            Ok(evaluation) => evaluations.push(evaluation),
            Err(e) => {
                warn!(
                    "Scoring failed for organization {}, skipping it: {:#}",
                    organization_id, e
                );
                failed.push(organization_id);
            }
        }
    }

    evaluations.sort_by_key(|e| e.org_index);
    failed.sort();
    (evaluations, failed)
}

fn score_organization(
    snapshot: &RunSnapshot,
    weights: &ScoringWeights,
    settings: &EvaluationSettings,
    org_index: usize,
    now: DateTime<Utc>,
) -> OrgEvaluation {
    let org = &snapshot.organizations[org_index];
    let mut engine = ScoringEngine::new(weights, &snapshot.aliases, settings.score_ttl)
        .with_semantic(settings.semantic_enabled);
    if settings.outcome_boost_enabled {
        engine = engine.with_outcomes(&snapshot.outcomes);
    }

    let records = snapshot
        .candidates
        .iter()
        .enumerate()
        .map(|(i, prepared)| (i, engine.score_pair(org, prepared, now)))
        .filter(|(_, record)| record.should_persist())
        .collect();

    OrgEvaluation {
        org_index,
        pairs_scored: snapshot.candidates.len(),
        records,
    }
}

/// Several candidates can share a trend key. Keep one record per key: the
/// highest score, a block over an unblocked zero, then the lowest candidate id.
fn collapse_by_trend_key(
    records: Vec<(usize, RelevanceScoreRecord)>,
) -> Vec<(usize, RelevanceScoreRecord)> {
    let mut best: HashMap<String, (usize, RelevanceScoreRecord)> = HashMap::new();
    for (index, record) in records {
        match best.get(&record.trend_key) {
            Some((_, current)) if !outranks(&record, current) => {}
            _ => {
                best.insert(record.trend_key.clone(), (index, record));
            }
        }
    }
    let mut kept: Vec<(usize, RelevanceScoreRecord)> = best.into_values().collect();
    kept.sort_by(|a, b| a.1.trend_key.cmp(&b.1.trend_key));
    kept
}

fn outranks(challenger: &RelevanceScoreRecord, current: &RelevanceScoreRecord) -> bool {
    challenger
        .relevance_score
        .partial_cmp(&current.relevance_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| challenger.is_blocked.cmp(&current.is_blocked))
        .then_with(|| current.candidate_id.cmp(&challenger.candidate_id))
        == Ordering::Greater
}
