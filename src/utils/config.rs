//! Run configuration read from the environment.

use anyhow::Result;
use chrono::Duration;
use log::{debug, warn};
use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::scoring::weights::ScoringWeights;

static DEFAULT_MAX_CONCURRENT_ORGS: Lazy<usize> = Lazy::new(|| num_cpus::get().clamp(1, 8));

#[derive(Debug, Clone, PartialEq)]
pub struct RelevanceConfig {
    /// Overrides `ScoringWeights::fuzzy_match_threshold` when set.
    pub fuzzy_match_threshold: Option<f64>,
    /// Overrides `ScoringWeights::min_entity_confidence` when set.
    pub min_entity_confidence: Option<f64>,
    pub alert_dedup_window_hours: i64,
    pub outcome_window_days: i64,
    pub score_ttl_hours: i64,
    pub write_batch_size: usize,
    pub alias_snapshot_limit: i64,
    pub candidate_lookback_hours: i64,
    pub max_concurrent_orgs: usize,
    pub scoring_weights_path: Option<PathBuf>,
}

impl Default for RelevanceConfig {
    fn default() -> Self {
        Self {
            fuzzy_match_threshold: None,
            min_entity_confidence: None,
            alert_dedup_window_hours: 4,
            outcome_window_days: 7,
            score_ttl_hours: 24,
            write_batch_size: 100,
            alias_snapshot_limit: 5000,
            candidate_lookback_hours: 24,
            max_concurrent_orgs: *DEFAULT_MAX_CONCURRENT_ORGS,
            scoring_weights_path: None,
        }
    }
}

impl RelevanceConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            fuzzy_match_threshold: env_opt::<f64>("FUZZY_MATCH_THRESHOLD")
                .map(|v| v.clamp(0.0, 1.0)),
            min_entity_confidence: env_opt::<f64>("MIN_ENTITY_CONFIDENCE")
                .map(|v| v.clamp(0.0, 1.0)),
            alert_dedup_window_hours: env_or("ALERT_DEDUP_WINDOW_HOURS", defaults.alert_dedup_window_hours)
                .max(0),
            outcome_window_days: env_or("OUTCOME_WINDOW_DAYS", defaults.outcome_window_days).max(0),
            score_ttl_hours: env_or("SCORE_TTL_HOURS", defaults.score_ttl_hours).max(1),
            write_batch_size: env_or("WRITE_BATCH_SIZE", defaults.write_batch_size).max(1),
            alias_snapshot_limit: env_or("ALIAS_SNAPSHOT_LIMIT", defaults.alias_snapshot_limit).max(0),
            candidate_lookback_hours: env_or("CANDIDATE_LOOKBACK_HOURS", defaults.candidate_lookback_hours)
                .max(1),
            max_concurrent_orgs: env_or("MAX_CONCURRENT_ORGS", defaults.max_concurrent_orgs).max(1),
            scoring_weights_path: env::var("SCORING_WEIGHTS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        };
        debug!("Relevance config: {:?}", config);
        config
    }

    /// Default weights, or the JSON override, with the env-level matching
    /// thresholds applied on top.
    pub fn scoring_weights(&self) -> Result<ScoringWeights> {
        let mut weights = match &self.scoring_weights_path {
            Some(path) => ScoringWeights::from_json_file(path)?,
            None => ScoringWeights::default(),
        };
        if let Some(threshold) = self.fuzzy_match_threshold {
            weights.fuzzy_match_threshold = threshold;
        }
        if let Some(confidence) = self.min_entity_confidence {
            weights.min_entity_confidence = confidence;
        }
        Ok(weights)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::hours(self.alert_dedup_window_hours)
    }

    pub fn outcome_window(&self) -> Duration {
        Duration::days(self.outcome_window_days)
    }

    pub fn score_ttl(&self) -> Duration {
        Duration::hours(self.score_ttl_hours)
    }

    pub fn candidate_lookback(&self) -> Duration {
        Duration::hours(self.candidate_lookback_hours)
    }
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring unparsable {}={:?}", key, raw);
            None
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env_opt(key).unwrap_or(default)
}
