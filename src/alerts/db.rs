// src/alerts/db.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, warn};
use postgres_types::ToSql;

use crate::alerts::dedup::RecentAlert;
use crate::models::alerts::{AlertRecord, AlertType};
use crate::models::stats_models::WriteReport;
use crate::utils::db_connect::{tally_batch, values_placeholders, PgPool};

pub const ALERTS_TABLE: &str = "public.trend_alerts";
const ALERT_COLUMNS: usize = 13;

/// Alerts triggered since `since`, used to seed the deduplicator.
pub async fn load_recent_alerts(
    pool: &PgPool,
    since: DateTime<Utc>,
    organization_ids: Option<&[String]>,
) -> Result<Vec<RecentAlert>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_recent_alerts")?;

    const SELECT_SQL: &str = "
        SELECT organization_id, entity_name, alert_type, triggered_at
        FROM public.trend_alerts
        WHERE triggered_at >= $1
          AND ($2::TEXT[] IS NULL OR organization_id = ANY($2))";

    let scope: Option<Vec<String>> = organization_ids.map(|ids| ids.to_vec());
    let rows = conn
        .query(SELECT_SQL, &[&since, &scope])
        .await
        .context("Failed to query recent trend_alerts")?;

    let mut recent = Vec::with_capacity(rows.len());
    for row in rows {
        let raw_type: String = row.get("alert_type");
        let Some(alert_type) = AlertType::from_str_opt(&raw_type) else {
            warn!("Ignoring recent alert with unknown alert_type '{}'", raw_type);
            continue;
        };
        recent.push(RecentAlert {
            organization_id: row.get("organization_id"),
            entity_name: row.get("entity_name"),
            alert_type,
            triggered_at: row.get("triggered_at"),
        });
    }
    debug!("Loaded {} alerts triggered since {}", recent.len(), since);
    Ok(recent)
}

/// Appends alerts in fixed-size batches. Each batch is its own transaction.
pub async fn insert_alerts(pool: &PgPool, alerts: &[AlertRecord], batch_size: usize) -> WriteReport {
    let mut report = WriteReport::default();
    for (batch_index, chunk) in alerts.chunks(batch_size.max(1)).enumerate() {
        let result = insert_alert_batch(pool, chunk).await;
        tally_batch(&mut report, ALERTS_TABLE, batch_index, chunk.len(), result);
    }
    report
}

async fn insert_alert_batch(pool: &PgPool, batch: &[AlertRecord]) -> Result<u64> {
    if batch.is_empty() {
        return Ok(0);
    }
    let mut conn = pool
        .get()
        .await
        .context("Failed to get DB connection for insert_alert_batch")?;
    let transaction = conn
        .transaction()
        .await
        .context("Failed to start transaction for alert batch insert")?;

    let mut params: Vec<Box<dyn ToSql + Sync + Send>> = Vec::with_capacity(batch.len() * ALERT_COLUMNS);
    for alert in batch {
        let sample_sources = serde_json::to_value(&alert.sample_sources)
            .context("Failed to serialize alert sample sources")?;
        params.push(Box::new(alert.id.clone()));
        params.push(Box::new(alert.organization_id.clone()));
        params.push(Box::new(alert.candidate_id.clone()));
        params.push(Box::new(alert.entity_name.clone()));
        params.push(Box::new(alert.alert_key.clone()));
        params.push(Box::new(alert.alert_type.as_str().to_string()));
        params.push(Box::new(alert.severity.as_str().to_string()));
        params.push(Box::new(alert.actionable_score));
        params.push(Box::new(alert.relevance_score));
        params.push(Box::new(alert.urgency_score));
        params.push(Box::new(sample_sources));
        params.push(Box::new(alert.suggested_action.clone()));
        params.push(Box::new(alert.triggered_at));
    }

    let insert_sql = format!(
        "INSERT INTO public.trend_alerts (
            id, organization_id, candidate_id, entity_name, alert_key, alert_type,
            severity, actionable_score, relevance_score, urgency_score,
            sample_sources, suggested_action, triggered_at
         ) VALUES {}",
        values_placeholders(batch.len(), ALERT_COLUMNS)
    );

    let params_slice: Vec<&(dyn ToSql + Sync)> = params
        .iter()
        .map(|p| p.as_ref() as &(dyn ToSql + Sync))
        .collect();

    let rows_affected = transaction
        .execute(insert_sql.as_str(), params_slice.as_slice())
        .await
        .context("Failed to execute batch insert for trend_alerts")?;
    transaction
        .commit()
        .await
        .context("Failed to commit trend_alerts batch transaction")?;

    if rows_affected as usize != batch.len() {
        warn!(
            "Alert batch row count mismatch: expected {}, inserted {}",
            batch.len(),
            rows_affected
        );
    }
    Ok(rows_affected)
}
