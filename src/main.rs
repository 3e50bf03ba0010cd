use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::time::Instant;

use relevance_lib::pipeline::{run_relevance, RunOptions};
use relevance_lib::utils::config::RelevanceConfig;
use relevance_lib::utils::db_connect::{connect, get_pool_status};
use relevance_lib::utils::env::{load_env, load_env_from_file};
use relevance_lib::utils::get_memory_usage;
use relevance_lib::utils::progress_config::ProgressConfig;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<String>,

    /// Only score these organizations (repeatable)
    #[arg(long = "org")]
    orgs: Vec<String>,

    /// Evaluate and report without writing scores, alerts or audit rows
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::init();
    info!("Starting trend relevance run");
    match &args.env_file {
        Some(path) => load_env_from_file(path)?,
        None => load_env(),
    }
    let start_time = Instant::now();

    let config = RelevanceConfig::from_env();
    let progress_config = ProgressConfig::from_env();
    info!(
        "Config: fuzzy threshold {:?}, dedup window {}h, outcome window {}d, batch size {}, max concurrent orgs {}",
        config.fuzzy_match_threshold,
        config.alert_dedup_window_hours,
        config.outcome_window_days,
        config.write_batch_size,
        config.max_concurrent_orgs
    );

    let pool = connect().await.context("Failed to connect to database")?;
    info!("Successfully connected to the database");

    let options = RunOptions {
        organization_ids: (!args.orgs.is_empty()).then(|| args.orgs.clone()),
        dry_run: args.dry_run,
    };
    let stats = run_relevance(&pool, &config, &options, &progress_config).await?;

    info!("=== Run Summary ===");
    info!("Run ID: {}", stats.run_id);
    info!("Organizations processed: {}", stats.organizations_processed);
    info!("Candidates scored: {}", stats.candidates_scored);
    info!("Scores created: {}", stats.scores_created);
    info!("High priority: {}", stats.high_priority_count);
    info!("Alerts generated: {}", stats.alerts_generated);
    info!("Total execution time: {:.2?}", start_time.elapsed());

    if progress_config.should_show_memory() {
        let final_memory_mb = get_memory_usage().await;
        info!("Final memory usage: {} MB", final_memory_mb);
    }
    if progress_config.should_show_db_connection_stats() {
        let (pool_size, available_connections, in_use_connections) = get_pool_status(&pool);
        info!(
            "Final DB Connection Pool Status: Total: {}, Available: {}, In Use: {}",
            pool_size, available_connections, in_use_connections
        );
    }

    info!("Run completed successfully!");
    Ok(())
}
