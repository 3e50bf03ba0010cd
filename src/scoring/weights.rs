// src/scoring/weights.rs - Every tunable number the scoring engine uses
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::matching::topics::TierScores;

/// Caps, flat points, thresholds and multipliers for relevance and urgency.
/// Missing fields in a JSON override fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub max_score: f64,

    pub topic_match_cap: f64,
    pub profile_topic_cap: f64,
    pub priority_lane_points: f64,
    pub focus_area_points: f64,
    pub key_issue_points: f64,

    pub allowlist_points: f64,
    pub stakeholder_points: f64,
    pub ally_points: f64,
    pub opponent_points: f64,
    pub geography_points: f64,

    pub velocity_cap: f64,
    pub velocity_floor: f64,
    pub breaking_points: f64,
    pub multi_source_points: f64,
    pub multi_source_min_sources: i32,

    pub semantic_cap: f64,
    /// Points awarded just above `semantic_min_similarity`; the rest of the cap
    /// scales linearly up to `semantic_full_similarity`.
    pub semantic_floor_points: f64,
    pub semantic_min_similarity: f64,
    pub semantic_full_similarity: f64,

    pub outcome_strong_positive_points: f64,
    pub outcome_positive_points: f64,

    pub breakthrough_multiplier: f64,
    pub breakthrough_min_sources: i32,

    pub exact_match_score: f64,
    pub alias_match_score: f64,
    pub fuzzy_match_threshold: f64,
    pub min_entity_confidence: f64,

    pub urgency_velocity_weight: f64,
    pub urgency_breaking_points: f64,
    pub urgency_acceleration_points: f64,
    pub urgency_acceleration_ratio: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            max_score: 100.0,

            topic_match_cap: 50.0,
            profile_topic_cap: 35.0,
            priority_lane_points: 15.0,
            focus_area_points: 12.0,
            key_issue_points: 10.0,

            allowlist_points: 15.0,
            stakeholder_points: 10.0,
            ally_points: 10.0,
            opponent_points: 12.0,
            geography_points: 8.0,

            velocity_cap: 15.0,
            velocity_floor: 50.0,
            breaking_points: 10.0,
            multi_source_points: 5.0,
            multi_source_min_sources: 3,

            semantic_cap: 20.0,
            semantic_floor_points: 8.0,
            semantic_min_similarity: 0.3,
            semantic_full_similarity: 0.9,

            outcome_strong_positive_points: 10.0,
            outcome_positive_points: 6.0,

            breakthrough_multiplier: 1.2,
            breakthrough_min_sources: 5,

            exact_match_score: 1.0,
            alias_match_score: 0.95,
            fuzzy_match_threshold: 0.75,
            min_entity_confidence: 0.4,

            urgency_velocity_weight: 0.7,
            urgency_breaking_points: 30.0,
            urgency_acceleration_points: 15.0,
            urgency_acceleration_ratio: 2.0,
        }
    }
}

impl ScoringWeights {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring weights from {}", path.display()))?;
        let weights: ScoringWeights = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse scoring weights in {}", path.display()))?;
        info!("Loaded scoring weights override from {}", path.display());
        Ok(weights)
    }

    pub fn tier_scores(&self) -> TierScores {
        TierScores {
            exact: self.exact_match_score,
            alias: self.alias_match_score,
            fuzzy_threshold: self.fuzzy_match_threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let weights: ScoringWeights =
            serde_json::from_str(r#"{"fuzzy_match_threshold": 0.8, "breaking_points": 12.0}"#).unwrap();
        assert_eq!(weights.fuzzy_match_threshold, 0.8);
        assert_eq!(weights.breaking_points, 12.0);
        assert_eq!(weights.topic_match_cap, 50.0);
        assert_eq!(weights.tier_scores().fuzzy_threshold, 0.8);
    }

    #[test]
    fn test_from_json_file_reports_missing_file() {
        let err = ScoringWeights::from_json_file(Path::new("/nonexistent/weights.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read scoring weights"));
    }
}
