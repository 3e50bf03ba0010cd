// src/pipeline/db.rs - Score upserts, TTL pruning and usage audit
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use postgres_types::ToSql;

use crate::models::scoring::RelevanceScoreRecord;
use crate::models::stats_models::WriteReport;
use crate::pipeline::evaluate::OrgUsage;
use crate::utils::db_connect::{tally_batch, values_placeholders, PgPool};

pub const SCORES_TABLE: &str = "public.trend_relevance_scores";
pub const USAGE_AUDIT_TABLE: &str = "public.relevance_usage_audit";
const SCORE_COLUMNS: usize = 15;
const USAGE_COLUMNS: usize = 7;

/// Upserts score records on (organization_id, trend_key) in fixed-size batches.
/// Callers must not pass two records with the same key in one call.
pub async fn upsert_scores(
    pool: &PgPool,
    records: &[RelevanceScoreRecord],
    batch_size: usize,
) -> WriteReport {
    let mut report = WriteReport::default();
    for (batch_index, chunk) in records.chunks(batch_size.max(1)).enumerate() {
        let result = upsert_score_batch(pool, chunk).await;
        tally_batch(&mut report, SCORES_TABLE, batch_index, chunk.len(), result);
    }
    report
}

async fn upsert_score_batch(pool: &PgPool, batch: &[RelevanceScoreRecord]) -> Result<u64> {
    if batch.is_empty() {
        return Ok(0);
    }
    let mut conn = pool
        .get()
        .await
        .context("Failed to get DB connection for upsert_score_batch")?;
    let transaction = conn
        .transaction()
        .await
        .context("Failed to start transaction for score batch upsert")?;

    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::with_capacity(batch.len() * SCORE_COLUMNS);
    for record in batch {
        params.push(Box::new(record.organization_id.clone()));
        params.push(Box::new(record.trend_key.clone()));
        params.push(Box::new(record.candidate_id.clone()));
        params.push(Box::new(record.relevance_score));
        params.push(Box::new(record.urgency_score));
        params.push(Box::new(record.priority_bucket.as_str().to_string()));
        params.push(Box::new(record.is_blocked));
        params.push(Box::new(record.is_allowlisted));
        params.push(Box::new(record.matched_topics.clone()));
        params.push(Box::new(record.matched_entities.clone()));
        params.push(Box::new(record.matched_stakeholders.clone()));
        params.push(Box::new(record.matched_geographies.clone()));
        params.push(Box::new(record.explanation.to_json()));
        params.push(Box::new(record.computed_at));
        params.push(Box::new(record.expires_at));
    }

    let upsert_sql = format!(
        "INSERT INTO public.trend_relevance_scores (
            organization_id, trend_key, candidate_id, relevance_score, urgency_score,
            priority_bucket, is_blocked, is_allowlisted, matched_topics, matched_entities,
            matched_stakeholders, matched_geographies, explanation, computed_at, expires_at
         ) VALUES {}
         ON CONFLICT (organization_id, trend_key) DO UPDATE SET
            candidate_id = EXCLUDED.candidate_id,
            relevance_score = EXCLUDED.relevance_score,
            urgency_score = EXCLUDED.urgency_score,
            priority_bucket = EXCLUDED.priority_bucket,
            is_blocked = EXCLUDED.is_blocked,
            is_allowlisted = EXCLUDED.is_allowlisted,
            matched_topics = EXCLUDED.matched_topics,
            matched_entities = EXCLUDED.matched_entities,
            matched_stakeholders = EXCLUDED.matched_stakeholders,
            matched_geographies = EXCLUDED.matched_geographies,
            explanation = EXCLUDED.explanation,
            computed_at = EXCLUDED.computed_at,
            expires_at = EXCLUDED.expires_at",
        values_placeholders(batch.len(), SCORE_COLUMNS)
    );

    let params_slice: Vec<&(dyn ToSql + Sync)> = params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect();

    debug!("Executing score upsert with {} parameters", params_slice.len());
    let rows_affected = transaction
        .execute(upsert_sql.as_str(), params_slice.as_slice())
        .await
        .context("Failed to execute batch upsert for trend_relevance_scores")?;
    transaction
        .commit()
        .await
        .context("Failed to commit trend_relevance_scores batch transaction")?;
    Ok(rows_affected)
}

/// Deletes score rows whose TTL has passed.
pub async fn prune_expired_scores(pool: &PgPool, now: DateTime<Utc>) -> Result<u64> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for prune_expired_scores")?;
    let deleted = conn
        .execute(
            "DELETE FROM public.trend_relevance_scores WHERE expires_at < $1",
            &[&now],
        )
        .await
        .context("Failed to prune expired trend_relevance_scores")?;
    if deleted > 0 {
        info!("Pruned {} expired relevance scores", deleted);
    }
    Ok(deleted)
}

/// One audit row per organization per run.
pub async fn insert_usage_audit(
    pool: &PgPool,
    run_id: &str,
    usage: &[OrgUsage],
    created_at: DateTime<Utc>,
    batch_size: usize,
) -> WriteReport {
    let mut report = WriteReport::default();
    for (batch_index, chunk) in usage.chunks(batch_size.max(1)).enumerate() {
        let result = insert_usage_batch(pool, run_id, chunk, created_at).await;
        tally_batch(&mut report, USAGE_AUDIT_TABLE, batch_index, chunk.len(), result);
    }
    report
}

async fn insert_usage_batch(
    pool: &PgPool,
    run_id: &str,
    batch: &[OrgUsage],
    created_at: DateTime<Utc>,
) -> Result<u64> {
    if batch.is_empty() {
        return Ok(0);
    }
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for insert_usage_batch")?;

    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::with_capacity(batch.len() * USAGE_COLUMNS);
    for entry in batch {
        params.push(Box::new(uuid::Uuid::new_v4().to_string()));
        params.push(Box::new(run_id.to_string()));
        params.push(Box::new(entry.organization_id.clone()));
        params.push(Box::new(entry.pairs_scored as i32));
        params.push(Box::new(entry.scores_created as i32));
        params.push(Box::new(entry.alerts_generated as i32));
        params.push(Box::new(created_at));
    }

    let insert_sql = format!(
        "INSERT INTO public.relevance_usage_audit (
            id, run_id, organization_id, candidates_scored, scores_created,
            alerts_generated, created_at
         ) VALUES {}",
        values_placeholders(batch.len(), USAGE_COLUMNS)
    );
    let params_slice: Vec<&(dyn ToSql + Sync)> = params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect();

    let rows_affected = conn
        .execute(insert_sql.as_str(), params_slice.as_slice())
        .await
        .context("Failed to execute batch insert for relevance_usage_audit")?;
    if rows_affected as usize != batch.len() {
        warn!(
            "Usage audit row count mismatch: expected {}, inserted {}",
            batch.len(),
            rows_affected
        );
    }
    Ok(rows_affected)
}
