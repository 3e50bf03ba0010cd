// src/alerts/classify.rs - Alert type, severity and suggested action for a scored pair
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::matching::text::{normalize, round2};
use crate::matching::topics::PreparedCandidate;
use crate::models::alerts::{AlertRecord, AlertSeverity, AlertType};
use crate::models::core::{Candidate, OrganizationProfile};
use crate::models::scoring::RelevanceScoreRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct AlertPolicy {
    pub trending_spike_velocity: f64,
    pub sentiment_shift_magnitude: f64,
    pub critical_urgency: f64,
    pub high_severity_score: f64,
    pub relevance_share: f64,
    pub urgency_share: f64,
    pub max_sample_sources: usize,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            trending_spike_velocity: 80.0,
            sentiment_shift_magnitude: 0.4,
            critical_urgency: 80.0,
            high_severity_score: 65.0,
            relevance_share: 0.7,
            urgency_share: 0.3,
            max_sample_sources: 5,
        }
    }
}

impl AlertPolicy {
    /// First rule that applies wins: breaking, then a velocity spike, then a
    /// sentiment swing; anything else is a plain spike.
    pub fn alert_type(&self, candidate: &Candidate) -> AlertType {
        if candidate.is_breaking {
            AlertType::Breaking
        } else if candidate.velocity >= self.trending_spike_velocity {
            AlertType::TrendingSpike
        } else if candidate
            .sentiment_delta
            .map_or(false, |delta| delta.abs() >= self.sentiment_shift_magnitude)
        {
            AlertType::SentimentShift
        } else {
            AlertType::Spike
        }
    }

    pub fn severity(&self, candidate: &Candidate, record: &RelevanceScoreRecord) -> AlertSeverity {
        if candidate.is_breaking || record.urgency_score >= self.critical_urgency {
            AlertSeverity::Critical
        } else if record.relevance_score >= self.high_severity_score {
            AlertSeverity::High
        } else {
            AlertSeverity::Medium
        }
    }

    pub fn actionable_score(&self, record: &RelevanceScoreRecord) -> f64 {
        round2(
            (record.relevance_score * self.relevance_share + record.urgency_score * self.urgency_share)
                .clamp(0.0, 100.0),
        )
    }

    /// Builds the alert for a scored pair, or `None` when the pair is blocked
    /// or under the organization's own threshold. Deduplication is the
    /// caller's job.
    pub fn build_alert(
        &self,
        profile: &OrganizationProfile,
        prepared: &PreparedCandidate,
        record: &RelevanceScoreRecord,
        now: DateTime<Utc>,
    ) -> Option<AlertRecord> {
        if record.is_blocked
            || record.relevance_score <= 0.0
            || record.relevance_score < profile.alert_threshold
        {
            return None;
        }
        let candidate = &prepared.candidate;
        let alert_type = self.alert_type(candidate);
        let entity_name = prepared.text.topic_canonical.clone();

        Some(AlertRecord {
            id: Uuid::new_v4().to_string(),
            organization_id: record.organization_id.clone(),
            candidate_id: candidate.id.clone(),
            alert_key: alert_key(&record.organization_id, &entity_name, alert_type),
            alert_type,
            severity: self.severity(candidate, record),
            actionable_score: self.actionable_score(record),
            relevance_score: record.relevance_score,
            urgency_score: record.urgency_score,
            sample_sources: candidate
                .sample_sources
                .iter()
                .take(self.max_sample_sources)
                .cloned()
                .collect(),
            suggested_action: suggested_action(alert_type, &entity_name),
            entity_name,
            triggered_at: now,
        })
    }
}

/// Stable hex digest of (organization, normalized entity, alert type).
pub fn alert_key(organization_id: &str, entity_name: &str, alert_type: AlertType) -> String {
    let entity = normalize(entity_name);
    let mut hasher = Sha256::new();
    hasher.update(organization_id.as_bytes());
    hasher.update(b"|");
    hasher.update(entity.as_bytes());
    hasher.update(b"|");
    hasher.update(alert_type.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

pub fn suggested_action(alert_type: AlertType, entity_name: &str) -> String {
    match alert_type {
        AlertType::Breaking => format!(
            "Breaking: review {} now and prepare a rapid response statement.",
            entity_name
        ),
        AlertType::TrendingSpike => format!(
            "{} is trending fast. Consider joining the conversation while attention is high.",
            entity_name
        ),
        AlertType::SentimentShift => format!(
            "Public sentiment on {} is shifting. Check messaging and brief spokespeople.",
            entity_name
        ),
        AlertType::Spike => format!(
            "Coverage of {} is rising. Monitor and share with the relevant team.",
            entity_name
        ),
    }
}
