// src/models/core.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One organization and the interest profile produced for it by the profiling
/// collaborator. `profile_loaded` is false when the organization exists but no
/// profile row was found (it is still scored from topics and entity rules).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizationProfile {
    pub organization_id: String,
    pub name: String,
    pub mission: Option<String>,
    pub focus_areas: Vec<String>,
    pub key_issues: Vec<String>,
    pub priority_lanes: Vec<String>,
    pub geographies: Vec<String>,
    pub stakeholders: Vec<String>,
    pub allies: Vec<String>,
    pub opponents: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub alert_threshold: f64,
    pub profile_loaded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestTopic {
    pub organization_id: String,
    pub topic: String,
    pub weight: f64,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    Allow,
    Deny,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleType::Allow => "allow",
            RuleType::Deny => "deny",
        }
    }

    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Some(RuleType::Allow),
            "deny" => Some(RuleType::Deny),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestEntity {
    pub organization_id: String,
    pub entity_name: String,
    pub rule_type: RuleType,
    pub reason: Option<String>,
    /// Extra words that confirm this entity is the one the org means.
    pub context_keywords: Vec<String>,
}

/// A trend as supplied by the trend-detection collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    /// Short label of the trending topic/entity. Source of the trend key and the
    /// alert entity; falls back to the title when empty.
    pub topic: String,
    pub title: String,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    pub geographies: Vec<String>,
    /// Percentage velocity, 0..=100.
    pub velocity: f64,
    pub is_breaking: bool,
    pub source_count: i32,
    pub mentions_1h: i32,
    pub mentions_24h: i32,
    pub sentiment_delta: Option<f64>,
    pub sample_sources: Vec<String>,
    pub embedding: Option<Vec<f32>>,
    pub detected_at: Option<DateTime<Utc>>,
}

impl Candidate {
    /// Title, summary and keywords joined into the text the matchers search.
    pub fn content(&self) -> String {
        let mut parts: Vec<&str> = vec![self.title.as_str()];
        if let Some(summary) = &self.summary {
            parts.push(summary.as_str());
        }
        parts.extend(self.keywords.iter().map(|k| k.as_str()));
        parts.join(" ")
    }

    pub fn label(&self) -> &str {
        if self.topic.trim().is_empty() {
            &self.title
        } else {
            &self.topic
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasEntry {
    pub raw_name: String,
    pub canonical_name: String,
    pub entity_type: String,
    pub confidence: f64,
    pub usage_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningSignal {
    StrongPositive,
    Positive,
    Neutral,
    Negative,
    StrongNegative,
}

impl LearningSignal {
    pub fn from_str_opt(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "strong_positive" => Some(LearningSignal::StrongPositive),
            "positive" => Some(LearningSignal::Positive),
            "neutral" => Some(LearningSignal::Neutral),
            "negative" => Some(LearningSignal::Negative),
            "strong_negative" => Some(LearningSignal::StrongNegative),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LearningSignal::StrongPositive => "strong_positive",
            LearningSignal::Positive => "positive",
            LearningSignal::Neutral => "neutral",
            LearningSignal::Negative => "negative",
            LearningSignal::StrongNegative => "strong_negative",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeCorrelation {
    pub organization_id: String,
    pub trend_key: String,
    pub learning_signal: LearningSignal,
    /// True when the correlation collaborator recommends boosting similar trends.
    pub should_boost: bool,
    pub performance_delta: f64,
    pub response_rate: f64,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
}

/// Everything the scorer needs to know about one organization.
#[derive(Debug, Clone, Default)]
pub struct OrganizationInterests {
    pub profile: OrganizationProfile,
    pub topics: Vec<InterestTopic>,
    pub entities: Vec<InterestEntity>,
}

impl OrganizationInterests {
    pub fn organization_id(&self) -> &str {
        &self.profile.organization_id
    }

    /// No profile and no topics: the org can still be matched on entity rules
    /// and embeddings, but most signals will be silent.
    pub fn is_configuration_missing(&self) -> bool {
        !self.profile.profile_loaded && self.topics.is_empty()
    }
}
