// src/models/scoring.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const HIGH_PRIORITY_MIN_SCORE: f64 = 65.0;
pub const MEDIUM_PRIORITY_MIN_SCORE: f64 = 35.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityBucket {
    High,
    Medium,
    Low,
}

impl PriorityBucket {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_PRIORITY_MIN_SCORE {
            PriorityBucket::High
        } else if score >= MEDIUM_PRIORITY_MIN_SCORE {
            PriorityBucket::Medium
        } else {
            PriorityBucket::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PriorityBucket::High => "high",
            PriorityBucket::Medium => "medium",
            PriorityBucket::Low => "low",
        }
    }
}

/// Ordered reasons plus a per-signal breakdown. `BTreeMap` keeps the JSON key
/// order stable so the same inputs always serialize to the same bytes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub reasons: Vec<String>,
    pub breakdown: BTreeMap<String, f64>,
}

impl Explanation {
    pub fn push(&mut self, key: &str, points: f64, reason: String) {
        self.breakdown.insert(key.to_string(), points);
        self.reasons.push(reason);
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "reasons": self.reasons,
            "breakdown": self.breakdown,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceScoreRecord {
    pub organization_id: String,
    pub trend_key: String,
    pub candidate_id: String,
    pub relevance_score: f64,
    pub urgency_score: f64,
    pub priority_bucket: PriorityBucket,
    pub is_blocked: bool,
    pub is_allowlisted: bool,
    pub matched_topics: Vec<String>,
    pub matched_entities: Vec<String>,
    pub matched_stakeholders: Vec<String>,
    pub matched_geographies: Vec<String>,
    pub explanation: Explanation,
    pub computed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl RelevanceScoreRecord {
    /// Pairs with no signal at all are not worth a row.
    pub fn should_persist(&self) -> bool {
        self.is_blocked || self.relevance_score > 0.0
    }
}
