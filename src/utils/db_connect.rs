// src/utils/db_connect.rs
use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::{info, warn};
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

use crate::errors::RelevanceError;
use crate::models::stats_models::WriteReport;

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Reads environment variables and constructs a PostgreSQL config.
fn build_pg_config() -> Config {
    let mut config = Config::new();
    let host = std::env::var("POSTGRES_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port_str = std::env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let port = port_str.parse::<u16>().unwrap_or(5432);
    let dbname = std::env::var("POSTGRES_DB").unwrap_or_else(|_| "dataplatform".to_string());
    let user = std::env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = std::env::var("POSTGRES_PASSWORD").unwrap_or_default();

    info!(
        "DB Config: Host={}, Port={}, DB={}, User={}",
        host, port, dbname, user
    );
    config
        .host(&host)
        .port(port)
        .dbname(&dbname)
        .user(&user)
        .password(&password);
    config.application_name("trend_relevance");
    config.connect_timeout(Duration::from_secs(10));
    config
}

/// Initializes the database connection pool.
pub async fn connect() -> Result<PgPool> {
    let config = build_pg_config();
    info!("Connecting to PostgreSQL database...");
    let manager = PostgresConnectionManager::new(config, NoTls);

    let pool = Pool::builder()
        .max_size(20)
        .min_idle(Some(2))
        .idle_timeout(Some(Duration::from_secs(180)))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    let conn = pool
        .get()
        .await
        .context("Failed to get test connection from pool")?;
    conn.query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;
    drop(conn);
    info!("Database connection pool initialized successfully.");
    Ok(pool)
}

/// (total, idle, in use) connections.
pub fn get_pool_status(pool: &PgPool) -> (u32, u32, u32) {
    let state = pool.state();
    (
        state.connections,
        state.idle_connections,
        state.connections.saturating_sub(state.idle_connections),
    )
}

/// `($1, $2, ...), ($n+1, ...)` for a multi-row VALUES clause.
pub fn values_placeholders(rows: usize, columns: usize) -> String {
    (0..rows)
        .map(|row| {
            let cells: Vec<String> = (1..=columns)
                .map(|col| format!("${}", row * columns + col))
                .collect();
            format!("({})", cells.join(", "))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Folds one batch outcome into the report. A failed batch is logged as a
/// partial write and counted; it never stops the remaining batches.
pub fn tally_batch(
    report: &mut WriteReport,
    table: &'static str,
    batch_index: usize,
    batch_len: usize,
    result: Result<u64>,
) {
    report.attempted += batch_len;
    match result {
        Ok(rows) => report.written += rows as usize,
        Err(e) => {
            report.failed_batches += 1;
            let err = RelevanceError::PartialWrite {
                table,
                batch_index,
                reason: format!("{:#}", e),
            };
            warn!("{} ({} rows skipped)", err, batch_len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_placeholders() {
        assert_eq!(values_placeholders(2, 3), "($1, $2, $3), ($4, $5, $6)");
        assert_eq!(values_placeholders(0, 3), "");
    }

    #[test]
    fn test_failed_batch_is_counted_not_raised() {
        let mut report = WriteReport::default();
        tally_batch(&mut report, "trend_alerts", 0, 100, Ok(100));
        tally_batch(&mut report, "trend_alerts", 1, 40, Err(anyhow::anyhow!("deadlock detected")));
        assert_eq!(report.attempted, 140);
        assert_eq!(report.written, 100);
        assert_eq!(report.failed_batches, 1);
    }
}
