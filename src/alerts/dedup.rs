// src/alerts/dedup.rs - Rolling-window alert suppression
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::collections::HashMap;

use crate::alerts::classify::alert_key;
use crate::models::alerts::{AlertRecord, AlertType};

/// An alert already in the store, as far as deduplication cares.
#[derive(Debug, Clone)]
pub struct RecentAlert {
    pub organization_id: String,
    pub entity_name: String,
    pub alert_type: AlertType,
    pub triggered_at: DateTime<Utc>,
}

/// Seeded from the alert history at run start, then updated in memory as the
/// run emits alerts, so the same key fires at most once per window. Runs that
/// overlap do not see each other's in-memory state.
#[derive(Debug, Clone)]
pub struct AlertDeduplicator {
    window: Duration,
    last_emitted: HashMap<String, DateTime<Utc>>,
    suppressed: usize,
}

impl AlertDeduplicator {
    pub fn new(window: Duration, recent: &[RecentAlert], now: DateTime<Utc>) -> Self {
        let cutoff = now - window;
        let mut last_emitted: HashMap<String, DateTime<Utc>> = HashMap::new();
        for alert in recent.iter().filter(|a| a.triggered_at >= cutoff) {
            let key = alert_key(&alert.organization_id, &alert.entity_name, alert.alert_type);
            let entry = last_emitted.entry(key).or_insert(alert.triggered_at);
            if alert.triggered_at > *entry {
                *entry = alert.triggered_at;
            }
        }
        debug!(
            "Alert deduplicator seeded with {} keys from the last {}h",
            last_emitted.len(),
            window.num_hours()
        );
        Self {
            window,
            last_emitted,
            suppressed: 0,
        }
    }

    pub fn is_suppressed(&self, key: &str, at: DateTime<Utc>) -> bool {
        self.last_emitted
            .get(key)
            .map_or(false, |last| at - *last < self.window)
    }

    /// Records the alert and returns it, or returns `None` if an alert with the
    /// same key is still inside the window.
    pub fn admit(&mut self, alert: AlertRecord) -> Option<AlertRecord> {
        if self.is_suppressed(&alert.alert_key, alert.triggered_at) {
            self.suppressed += 1;
            debug!(
                "Suppressed duplicate {} alert for org {} on '{}'",
                alert.alert_type.as_str(),
                alert.organization_id,
                alert.entity_name
            );
            return None;
        }
        self.last_emitted
            .insert(alert.alert_key.clone(), alert.triggered_at);
        Some(alert)
    }

    pub fn suppressed_count(&self) -> usize {
        self.suppressed
    }

    pub fn tracked_keys(&self) -> usize {
        self.last_emitted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::alerts::AlertSeverity;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn alert(org: &str, entity: &str, candidate_id: &str, at: DateTime<Utc>) -> AlertRecord {
        AlertRecord {
            id: candidate_id.to_string(),
            organization_id: org.to_string(),
            candidate_id: candidate_id.to_string(),
            entity_name: entity.to_string(),
            alert_key: alert_key(org, entity, AlertType::Spike),
            alert_type: AlertType::Spike,
            severity: AlertSeverity::Medium,
            actionable_score: 50.0,
            relevance_score: 60.0,
            urgency_score: 30.0,
            sample_sources: vec![],
            suggested_action: String::new(),
            triggered_at: at,
        }
    }

    #[test]
    fn test_same_key_in_one_run_yields_one_alert() {
        let mut dedup = AlertDeduplicator::new(Duration::hours(4), &[], now());
        assert!(dedup.admit(alert("org-1", "EPA", "c1", now())).is_some());
        assert!(dedup.admit(alert("org-1", "epa", "c2", now())).is_none());
        assert!(dedup.admit(alert("org-2", "EPA", "c1", now())).is_some());
        assert_eq!(dedup.suppressed_count(), 1);
        assert_eq!(dedup.tracked_keys(), 2);
    }

    #[test]
    fn test_seeded_history_respects_window() {
        let recent = vec![
            RecentAlert {
                organization_id: "org-1".to_string(),
                entity_name: "EPA".to_string(),
                alert_type: AlertType::Spike,
                triggered_at: now() - Duration::hours(3),
            },
            RecentAlert {
                organization_id: "org-1".to_string(),
                entity_name: "NASA".to_string(),
                alert_type: AlertType::Spike,
                triggered_at: now() - Duration::hours(5),
            },
        ];
        let mut dedup = AlertDeduplicator::new(Duration::hours(4), &recent, now());
        assert_eq!(dedup.tracked_keys(), 1);
        assert!(dedup.admit(alert("org-1", "EPA", "c1", now())).is_none());
        assert!(dedup.admit(alert("org-1", "NASA", "c2", now())).is_some());
        assert!(dedup
            .admit(alert("org-1", "EPA", "c3", now() + Duration::hours(1)))
            .is_some());
    }
}
