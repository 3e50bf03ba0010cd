// src/feedback/outcome.rs - Historical outcome correlation → bounded learning bonus
use chrono::{DateTime, Duration, Utc};
use log::debug;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::matching::canonical::AliasSnapshot;
use crate::matching::text::normalize;
use crate::models::core::{LearningSignal, OutcomeCorrelation};
use crate::scoring::weights::ScoringWeights;

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeBonus {
    pub points: f64,
    pub signal: LearningSignal,
    pub performance_delta: f64,
}

/// One correlation per (organization, canonical trend key): the boost-eligible
/// record with the highest performance delta inside the trailing window. Trend
/// keys go through the alias table, so history recorded under "EPA" applies to
/// "environmental protection agency".
#[derive(Debug, Clone, Default)]
pub struct OutcomeIndex {
    best: HashMap<(String, String), OutcomeCorrelation>,
}

impl OutcomeIndex {
    pub fn build(
        records: Vec<OutcomeCorrelation>,
        aliases: &AliasSnapshot,
        now: DateTime<Utc>,
        window: Duration,
    ) -> Self {
        let cutoff = now - window;
        let mut best: HashMap<(String, String), OutcomeCorrelation> = HashMap::new();
        let mut considered = 0usize;

        for record in records {
            if !record.should_boost || record.window_end < cutoff {
                continue;
            }
            let trend_key = aliases.canonical_key(&record.trend_key);
            if trend_key.is_empty() {
                continue;
            }
            considered += 1;
            let key = (record.organization_id.clone(), trend_key);
            match best.get(&key) {
                Some(current) if !outranks(&record, current) => {}
                _ => {
                    best.insert(key, record);
                }
            }
        }

        debug!(
            "Outcome index: {} eligible correlations collapsed to {} keys",
            considered,
            best.len()
        );
        Self { best }
    }

    pub fn len(&self) -> usize {
        self.best.len()
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// `trend_key` is a candidate's trend key, already in canonical form.
    pub fn lookup(&self, organization_id: &str, trend_key: &str) -> Option<&OutcomeCorrelation> {
        self.best
            .get(&(organization_id.to_string(), normalize(trend_key)))
    }

    pub fn bonus_for(
        &self,
        organization_id: &str,
        trend_key: &str,
        weights: &ScoringWeights,
    ) -> Option<OutcomeBonus> {
        self.lookup(organization_id, trend_key)
            .and_then(|correlation| learning_bonus(correlation, weights))
    }
}

/// Ties on delta go to the later window, then the higher response rate.
fn outranks(challenger: &OutcomeCorrelation, current: &OutcomeCorrelation) -> bool {
    let ordering = challenger
        .performance_delta
        .partial_cmp(&current.performance_delta)
        .unwrap_or(Ordering::Equal)
        .then_with(|| challenger.window_end.cmp(&current.window_end))
        .then_with(|| {
            challenger
                .response_rate
                .partial_cmp(&current.response_rate)
                .unwrap_or(Ordering::Equal)
        });
    ordering == Ordering::Greater
}

pub fn learning_bonus(correlation: &OutcomeCorrelation, weights: &ScoringWeights) -> Option<OutcomeBonus> {
    if !correlation.should_boost {
        return None;
    }
    let points = match correlation.learning_signal {
        LearningSignal::StrongPositive => weights.outcome_strong_positive_points,
        LearningSignal::Positive => weights.outcome_positive_points,
        _ => return None,
    };
    Some(OutcomeBonus {
        points,
        signal: correlation.learning_signal,
        performance_delta: correlation.performance_delta,
    })
}
