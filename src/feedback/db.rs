// src/feedback/db.rs - Reads outcome correlations produced by the correlation job
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use tokio_postgres::Row as PgRow;

use crate::models::core::{LearningSignal, OutcomeCorrelation};
use crate::utils::db_connect::PgPool;

/// Correlations whose window ended after `cutoff`, optionally scoped to a set
/// of organizations. Rows with an unknown learning signal are skipped.
pub async fn load_outcome_correlations(
    pool: &PgPool,
    cutoff: DateTime<Utc>,
    organization_ids: Option<&[String]>,
) -> Result<Vec<OutcomeCorrelation>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_outcome_correlations")?;

    const SELECT_SQL: &str = "
        SELECT organization_id, trend_key, learning_signal, should_boost,
               performance_delta, response_rate, window_start, window_end
        FROM public.outcome_correlations
        WHERE window_end >= $1
          AND ($2::TEXT[] IS NULL OR organization_id = ANY($2))
        ORDER BY organization_id, trend_key, window_end DESC";

    let scope: Option<Vec<String>> = organization_ids.map(|ids| ids.to_vec());
    let rows = conn
        .query(SELECT_SQL, &[&cutoff, &scope])
        .await
        .context("Failed to query outcome_correlations")?;

    let mut correlations = Vec::with_capacity(rows.len());
    let mut skipped = 0usize;
    for row in &rows {
        match correlation_from_row(row) {
            Some(correlation) => correlations.push(correlation),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(
            "Skipped {} outcome correlations with an unrecognized learning_signal",
            skipped
        );
    }
    debug!("Loaded {} outcome correlations since {}", correlations.len(), cutoff);
    Ok(correlations)
}

fn correlation_from_row(row: &PgRow) -> Option<OutcomeCorrelation> {
    let signal: String = row.get("learning_signal");
    let learning_signal = LearningSignal::from_str_opt(&signal)?;
    Some(OutcomeCorrelation {
        organization_id: row.get("organization_id"),
        trend_key: row.get("trend_key"),
        learning_signal,
        should_boost: row.get::<_, Option<bool>>("should_boost").unwrap_or(false),
        performance_delta: row.get::<_, Option<f64>>("performance_delta").unwrap_or(0.0),
        response_rate: row.get::<_, Option<f64>>("response_rate").unwrap_or(0.0),
        window_start: row.get("window_start"),
        window_end: row.get("window_end"),
    })
}
