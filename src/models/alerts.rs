// src/models/alerts.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    Breaking,
    TrendingSpike,
    SentimentShift,
    Spike,
}

impl AlertType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::Breaking => "breaking",
            AlertType::TrendingSpike => "trending_spike",
            AlertType::SentimentShift => "sentiment_shift",
            AlertType::Spike => "spike",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim() {
            "breaking" => Some(AlertType::Breaking),
            "trending_spike" => Some(AlertType::TrendingSpike),
            "sentiment_shift" => Some(AlertType::SentimentShift),
            "spike" => Some(AlertType::Spike),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::High => "high",
            AlertSeverity::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    pub organization_id: String,
    pub candidate_id: String,
    pub entity_name: String,
    pub alert_key: String,
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub actionable_score: f64,
    pub relevance_score: f64,
    pub urgency_score: f64,
    pub sample_sources: Vec<String>,
    pub suggested_action: String,
    pub triggered_at: DateTime<Utc>,
}
