// src/scoring/engine.rs - Relevance and urgency for one (organization, candidate) pair
use chrono::{DateTime, Duration, Utc};
use log::debug;

use crate::feedback::outcome::OutcomeIndex;
use crate::matching::canonical::AliasSnapshot;
use crate::matching::context::{assess_entity, check_geography, find_deny_hit, GeographyCheck};
use crate::matching::text::{cosine_similarity, normalize, round2};
use crate::matching::topics::{match_entity, match_topic, PreparedCandidate, TermMatch, TierScores};
use crate::models::core::{Candidate, InterestEntity, OrganizationInterests, RuleType};
use crate::models::scoring::{Explanation, PriorityBucket, RelevanceScoreRecord};
use crate::scoring::weights::ScoringWeights;

pub const NO_MATCH_REASON: &str = "no specific matches";

/// Scores candidates for organizations. Semantic similarity and the outcome
/// booster are optional stages: with them switched off the remaining signals
/// score exactly as before.
#[derive(Debug, Clone)]
pub struct ScoringEngine<'a> {
    weights: &'a ScoringWeights,
    aliases: &'a AliasSnapshot,
    outcomes: Option<&'a OutcomeIndex>,
    semantic_enabled: bool,
    tiers: TierScores,
    score_ttl: Duration,
}

impl<'a> ScoringEngine<'a> {
    pub fn new(weights: &'a ScoringWeights, aliases: &'a AliasSnapshot, score_ttl: Duration) -> Self {
        Self {
            weights,
            aliases,
            outcomes: None,
            semantic_enabled: true,
            tiers: weights.tier_scores(),
            score_ttl,
        }
    }

    pub fn with_outcomes(mut self, outcomes: &'a OutcomeIndex) -> Self {
        self.outcomes = Some(outcomes);
        self
    }

    pub fn with_semantic(mut self, enabled: bool) -> Self {
        self.semantic_enabled = enabled;
        self
    }

    pub fn score_pair(
        &self,
        org: &OrganizationInterests,
        prepared: &PreparedCandidate,
        now: DateTime<Utc>,
    ) -> RelevanceScoreRecord {
        let mut record = RelevanceScoreRecord {
            organization_id: org.organization_id().to_string(),
            trend_key: prepared.trend_key.clone(),
            candidate_id: prepared.candidate.id.clone(),
            relevance_score: 0.0,
            urgency_score: 0.0,
            priority_bucket: PriorityBucket::Low,
            is_blocked: false,
            is_allowlisted: false,
            matched_topics: Vec::new(),
            matched_entities: Vec::new(),
            matched_stakeholders: Vec::new(),
            matched_geographies: Vec::new(),
            explanation: Explanation::default(),
            computed_at: now,
            expires_at: now + self.score_ttl,
        };

        // Deny rules veto before anything else is looked at.
        if let Some(hit) = find_deny_hit(&org.entities, &prepared.text, self.aliases, &self.tiers) {
            let mut reason = format!(
                "blocked by deny rule '{}' ({} match on '{}')",
                hit.entity_name,
                hit.matched.tier.as_str(),
                hit.matched.matched_on
            );
            if let Some(why) = hit.reason.as_deref().filter(|r| !r.trim().is_empty()) {
                reason.push_str(&format!(": {}", why));
            }
            record.is_blocked = true;
            record.matched_entities.push(hit.entity_name);
            record.explanation.push("deny_rule", 0.0, reason);
            return record;
        }

        record.urgency_score = urgency_score(&prepared.candidate, self.weights);

        let geography = check_geography(&org.profile.geographies, &prepared.text);
        let mut subtotal = 0.0;
        let mut has_relevance_signal = false;

        if let Some(points) = self.topic_points(org, prepared, &geography, &mut record) {
            subtotal += points;
            has_relevance_signal = true;
        } else if let Some(points) = self.profile_topic_points(org, prepared, &mut record) {
            subtotal += points;
            has_relevance_signal = true;
        }

        if let Some(points) = self.allowlist_points(&org.entities, prepared, &geography, &mut record) {
            subtotal += points;
            has_relevance_signal = true;
        }

        let groups = [
            ("stakeholder", &org.profile.stakeholders, self.weights.stakeholder_points),
            ("ally", &org.profile.allies, self.weights.ally_points),
            ("opponent", &org.profile.opponents, self.weights.opponent_points),
        ];
        for (key, names, points) in groups {
            if let Some(name) = self.first_gated_match(names, &[], prepared, &geography) {
                record
                    .explanation
                    .push(key, points, format!("{} mentioned: {}", key, name));
                record.matched_stakeholders.push(name);
                subtotal += points;
                has_relevance_signal = true;
            }
        }

        if self.semantic_enabled {
            let similarity = cosine_similarity(
                org.profile.embedding.as_deref(),
                prepared.candidate.embedding.as_deref(),
            );
            let points = round2(semantic_points(similarity, self.weights));
            if points > 0.0 {
                record.explanation.push(
                    "semantic_match",
                    points,
                    format!("semantic similarity {:.2} to the organization profile", similarity),
                );
                subtotal += points;
                has_relevance_signal = true;
            }
        }

        if !has_relevance_signal {
            record.explanation = Explanation {
                reasons: vec![NO_MATCH_REASON.to_string()],
                ..Default::default()
            };
            return record;
        }

        subtotal += self.amplifier_points(org, prepared, &geography, &mut record);

        let candidate = &prepared.candidate;
        if candidate.source_count >= self.weights.breakthrough_min_sources {
            let multiplier = self.weights.breakthrough_multiplier;
            record.explanation.push(
                "breakthrough_multiplier",
                multiplier,
                format!(
                    "breakthrough: {} independent sources (x{:.2})",
                    candidate.source_count, multiplier
                ),
            );
            subtotal *= multiplier;
        }

        record.relevance_score = round2(subtotal.clamp(0.0, self.weights.max_score));
        record.priority_bucket = PriorityBucket::from_score(record.relevance_score);
        record
    }

    /// Best single interest topic: weight x match strength x geography factor,
    /// scaled to the topic cap.
    fn topic_points(
        &self,
        org: &OrganizationInterests,
        prepared: &PreparedCandidate,
        geography: &GeographyCheck,
        record: &mut RelevanceScoreRecord,
    ) -> Option<f64> {
        let factor = geography.factor();
        let mut best: Option<(f64, TermMatch, f64)> = None;

        for topic in &org.topics {
            if topic.weight <= 0.0 || topic.topic.trim().is_empty() {
                continue;
            }
            let Some(matched) = match_topic(&topic.topic, &prepared.text, self.aliases, &self.tiers)
            else {
                continue;
            };
            let weight = topic.weight.min(1.0);
            let contribution = weight * matched.score * factor;
            if !record.matched_topics.contains(&topic.topic) {
                record.matched_topics.push(topic.topic.clone());
            }
            if best.as_ref().map_or(true, |(c, _, _)| contribution > *c) {
                best = Some((contribution, matched, weight));
            }
        }

        let (contribution, matched, weight) = best?;
        let points = round2((contribution * self.weights.topic_match_cap).min(self.weights.topic_match_cap));
        let mut reason = format!(
            "topic '{}' matched '{}' ({} {:.2}, weight {:.2})",
            matched.term,
            matched.matched_on,
            matched.tier.as_str(),
            matched.score,
            weight
        );
        if factor < 1.0 {
            reason.push_str(", outside declared geographies");
        }
        record.explanation.push("topic_match", points, reason);
        Some(points)
    }

    /// Fallback when no interest topic matched: flat points per profile term.
    fn profile_topic_points(
        &self,
        org: &OrganizationInterests,
        prepared: &PreparedCandidate,
        record: &mut RelevanceScoreRecord,
    ) -> Option<f64> {
        if !org.profile.profile_loaded {
            return None;
        }
        let groups = [
            ("priority lane", &org.profile.priority_lanes, self.weights.priority_lane_points),
            ("focus area", &org.profile.focus_areas, self.weights.focus_area_points),
            ("key issue", &org.profile.key_issues, self.weights.key_issue_points),
        ];

        let mut seen: Vec<String> = Vec::new();
        let mut total = 0.0;
        let mut labels = Vec::new();
        for (label, terms, points) in groups {
            for term in terms.iter() {
                let key = normalize(term);
                if key.is_empty() || seen.contains(&key) {
                    continue;
                }
                seen.push(key);
                if match_topic(term, &prepared.text, self.aliases, &self.tiers).is_some() {
                    total += points;
                    labels.push(format!("{} '{}'", label, term));
                    if !record.matched_topics.contains(term) {
                        record.matched_topics.push(term.clone());
                    }
                }
            }
        }

        if labels.is_empty() {
            return None;
        }
        let points = round2(total.min(self.weights.profile_topic_cap));
        record.explanation.push(
            "profile_topic_match",
            points,
            format!("profile match: {}", labels.join(", ")),
        );
        Some(points)
    }

    fn allowlist_points(
        &self,
        rules: &[InterestEntity],
        prepared: &PreparedCandidate,
        geography: &GeographyCheck,
        record: &mut RelevanceScoreRecord,
    ) -> Option<f64> {
        for rule in rules.iter().filter(|r| r.rule_type == RuleType::Allow) {
            let Some(matched) = match_entity(&rule.entity_name, &prepared.text, self.aliases, &self.tiers)
            else {
                continue;
            };
            let entity_type = self.aliases.resolve(&rule.entity_name).entity_type;
            let gate = assess_entity(&entity_type, &rule.context_keywords, &prepared.text, geography);
            if !gate.is_valid(self.weights.min_entity_confidence) {
                debug!(
                    "Allowlist entity '{}' rejected for {} (confidence {:.2}, excluded: {})",
                    rule.entity_name, prepared.candidate.id, gate.confidence, gate.excluded
                );
                continue;
            }

            let points = self.weights.allowlist_points;
            record.is_allowlisted = true;
            record.matched_entities.push(rule.entity_name.clone());
            record.explanation.push(
                "allowlist_entity",
                points,
                format!(
                    "allowlisted entity '{}' ({} match, confidence {:.2})",
                    rule.entity_name,
                    matched.tier.as_str(),
                    gate.confidence
                ),
            );
            return Some(points);
        }
        None
    }

    /// First name in the list that matches and survives contextual gating.
    fn first_gated_match(
        &self,
        names: &[String],
        context_keywords: &[String],
        prepared: &PreparedCandidate,
        geography: &GeographyCheck,
    ) -> Option<String> {
        names.iter().find_map(|name| {
            match_entity(name, &prepared.text, self.aliases, &self.tiers)?;
            let entity_type = self.aliases.resolve(name).entity_type;
            let gate = assess_entity(&entity_type, context_keywords, &prepared.text, geography);
            gate.is_valid(self.weights.min_entity_confidence)
                .then(|| name.clone())
        })
    }

    /// Signals that strengthen an existing match but never create one.
    fn amplifier_points(
        &self,
        org: &OrganizationInterests,
        prepared: &PreparedCandidate,
        geography: &GeographyCheck,
        record: &mut RelevanceScoreRecord,
    ) -> f64 {
        let candidate = &prepared.candidate;
        let weights = self.weights;
        let mut total = 0.0;

        if !geography.matched.is_empty() {
            record.matched_geographies = geography.matched.clone();
            record.explanation.push(
                "geography",
                weights.geography_points,
                format!("geography match: {}", geography.matched.join(", ")),
            );
            total += weights.geography_points;
        }

        let velocity = round2(velocity_points(candidate.velocity, weights));
        if velocity > 0.0 {
            record.explanation.push(
                "velocity",
                velocity,
                format!("trend velocity {:.0}%", candidate.velocity),
            );
            total += velocity;
        }

        if candidate.is_breaking {
            record
                .explanation
                .push("breaking_news", weights.breaking_points, "breaking news".to_string());
            total += weights.breaking_points;
        }

        if candidate.source_count >= weights.multi_source_min_sources {
            record.explanation.push(
                "multi_source",
                weights.multi_source_points,
                format!("reported by {} sources", candidate.source_count),
            );
            total += weights.multi_source_points;
        }

        if let Some(index) = self.outcomes {
            if let Some(bonus) = index.bonus_for(org.organization_id(), &prepared.trend_key, weights) {
                record.explanation.push(
                    "outcome_learning",
                    bonus.points,
                    format!(
                        "similar trends performed well before ({}, delta {:+.2})",
                        bonus.signal.as_str(),
                        bonus.performance_delta
                    ),
                );
                total += bonus.points;
            }
        }

        total
    }
}

/// Percentage velocity above the floor, scaled linearly to the cap.
pub fn velocity_points(velocity: f64, weights: &ScoringWeights) -> f64 {
    if !velocity.is_finite() || velocity <= weights.velocity_floor {
        return 0.0;
    }
    let span = (100.0 - weights.velocity_floor).max(f64::EPSILON);
    ((velocity - weights.velocity_floor) / span * weights.velocity_cap).min(weights.velocity_cap)
}

/// Nothing at or below the minimum similarity; above it, the floor points plus a
/// linear share of the rest of the cap up to the full-credit similarity.
pub fn semantic_points(similarity: f64, weights: &ScoringWeights) -> f64 {
    if !similarity.is_finite() || similarity <= weights.semantic_min_similarity {
        return 0.0;
    }
    let span = (weights.semantic_full_similarity - weights.semantic_min_similarity).max(f64::EPSILON);
    let progress = ((similarity.min(weights.semantic_full_similarity) - weights.semantic_min_similarity)
        / span)
        .clamp(0.0, 1.0);
    (weights.semantic_floor_points + progress * (weights.semantic_cap - weights.semantic_floor_points))
        .min(weights.semantic_cap)
}

/// Time sensitivity, independent of relevance: weighted velocity, a breaking
/// bump, and a bump when the last hour runs well ahead of the daily average.
pub fn urgency_score(candidate: &Candidate, weights: &ScoringWeights) -> f64 {
    let velocity = if candidate.velocity.is_finite() {
        candidate.velocity.clamp(0.0, 100.0)
    } else {
        0.0
    };
    let mut urgency = velocity * weights.urgency_velocity_weight;
    if candidate.is_breaking {
        urgency += weights.urgency_breaking_points;
    }
    if candidate.mentions_1h > 0 && candidate.mentions_24h > 0 {
        let hourly_average = candidate.mentions_24h as f64 / 24.0;
        if candidate.mentions_1h as f64 >= hourly_average * weights.urgency_acceleration_ratio {
            urgency += weights.urgency_acceleration_points;
        }
    }
    round2(urgency.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::outcome::tests::correlation;
    use crate::matching::canonical::tests::fixture_snapshot;
    use crate::models::core::{InterestTopic, LearningSignal, OrganizationProfile};

    fn now() -> DateTime<Utc> {
        use chrono::TimeZone;
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    fn org(topics: &[(&str, f64)], entities: Vec<InterestEntity>) -> OrganizationInterests {
        OrganizationInterests {
            profile: OrganizationProfile {
                organization_id: "org-1".to_string(),
                name: "Green Future".to_string(),
                alert_threshold: 60.0,
                ..Default::default()
            },
            topics: topics
                .iter()
                .map(|(topic, weight)| InterestTopic {
                    organization_id: "org-1".to_string(),
                    topic: topic.to_string(),
                    weight: *weight,
                    source: "manual".to_string(),
                })
                .collect(),
            entities,
        }
    }

    fn rule(name: &str, rule_type: RuleType) -> InterestEntity {
        InterestEntity {
            organization_id: "org-1".to_string(),
            entity_name: name.to_string(),
            rule_type,
            reason: None,
            context_keywords: vec![],
        }
    }

    fn prepared(candidate: Candidate) -> PreparedCandidate {
        PreparedCandidate::new(candidate, &fixture_snapshot())
    }

    fn climate_candidate() -> Candidate {
        Candidate {
            id: "cand-1".to_string(),
            topic: "Climate Change Summit".to_string(),
            title: "Climate Change Summit Draws Record Crowds".to_string(),
            velocity: 60.0,
            source_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_climate_topic_match() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let record = engine.score_pair(&org(&[("climate", 0.8)], vec![]), &prepared(climate_candidate()), now());

        assert!(record.explanation.breakdown["topic_match"] >= 40.0);
        assert!(record.explanation.breakdown["velocity"] > 0.0);
        assert_eq!(record.matched_topics, vec!["climate".to_string()]);
        assert_eq!(record.relevance_score, 43.0);
        assert_eq!(record.priority_bucket, PriorityBucket::Medium);
        assert!(!record.is_blocked);
        assert_eq!(record.expires_at, now() + Duration::hours(24));
    }

    #[test]
    fn test_deny_rule_blocks_everything() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let interests = org(
            &[("investigation", 1.0)],
            vec![rule("Acme Corp", RuleType::Allow), rule("Acme Corp", RuleType::Deny)],
        );
        let candidate = Candidate {
            id: "cand-2".to_string(),
            title: "Acme Corp Faces Investigation".to_string(),
            velocity: 95.0,
            is_breaking: true,
            source_count: 8,
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(candidate), now());

        assert!(record.is_blocked);
        assert_eq!(record.relevance_score, 0.0);
        assert_eq!(record.priority_bucket, PriorityBucket::Low);
        assert!(!record.is_allowlisted);
        assert_eq!(record.explanation.breakdown.len(), 1);
        assert_eq!(record.explanation.breakdown["deny_rule"], 0.0);
        assert!(record.explanation.reasons[0].contains("Acme Corp"));
        assert!(record.should_persist());
    }

    #[test]
    fn test_entity_rules_need_whole_word_matches() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let interests = org(
            &[("research", 1.0)],
            vec![rule("Ford", RuleType::Deny), rule("Ford", RuleType::Allow)],
        );
        let stanford = Candidate {
            id: "cand-9".to_string(),
            title: "Stanford University research breakthrough".to_string(),
            entities: vec!["Stanford University".to_string()],
            velocity: 40.0,
            source_count: 1,
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(stanford), now());

        assert!(!record.is_blocked);
        assert!(!record.is_allowlisted);
        assert!(record.relevance_score > 0.0);
        assert!(record.explanation.breakdown.contains_key("topic_match"));
        assert!(!record.explanation.breakdown.contains_key("deny_rule"));
        assert!(!record.explanation.breakdown.contains_key("allowlist_entity"));

        let ford = Candidate {
            id: "cand-10".to_string(),
            title: "Automaker expands research budget".to_string(),
            entities: vec!["Ford Motor Company".to_string()],
            velocity: 40.0,
            source_count: 1,
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(ford), now());
        assert!(record.is_blocked);
        assert_eq!(record.relevance_score, 0.0);
    }

    #[test]
    fn test_no_match_scores_zero() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let candidate = Candidate {
            id: "cand-3".to_string(),
            title: "Local team wins championship".to_string(),
            velocity: 90.0,
            is_breaking: true,
            source_count: 6,
            ..Default::default()
        };
        let record = engine.score_pair(&org(&[("housing", 1.0)], vec![]), &prepared(candidate), now());

        assert_eq!(record.relevance_score, 0.0);
        assert_eq!(record.explanation.reasons, vec![NO_MATCH_REASON.to_string()]);
        assert!(record.explanation.breakdown.is_empty());
        assert!(record.urgency_score > 0.0);
        assert!(!record.should_persist());
    }

    #[test]
    fn test_semantic_only_match() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let mut interests = org(&[("housing", 1.0)], vec![]);
        interests.profile.embedding = Some(vec![1.0, 0.0]);
        let candidate = Candidate {
            id: "cand-4".to_string(),
            title: "Quarterly report released".to_string(),
            embedding: Some(vec![0.5, 0.75f32.sqrt()]),
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(candidate.clone()), now());

        assert!(!record.explanation.breakdown.contains_key("topic_match"));
        assert_eq!(record.explanation.breakdown["semantic_match"], 12.0);
        assert_eq!(record.relevance_score, 12.0);

        let disabled = ScoringEngine::new(&weights, &aliases, Duration::hours(24)).with_semantic(false);
        let record = disabled.score_pair(&interests, &prepared(candidate), now());
        assert_eq!(record.relevance_score, 0.0);
    }

    #[test]
    fn test_score_is_clamped_when_every_signal_fires() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let outcomes = OutcomeIndex::build(
            vec![correlation(
                "org-1",
                "Climate Change Summit",
                LearningSignal::StrongPositive,
                true,
                0.4,
                now(),
            )],
            &aliases,
            now(),
            Duration::days(7),
        );
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24)).with_outcomes(&outcomes);

        let mut interests = org(&[("climate", 1.0)], vec![rule("Jane Doe", RuleType::Allow)]);
        interests.profile.geographies = vec!["Texas".to_string()];
        interests.profile.stakeholders = vec!["Acme Corp".to_string()];
        interests.profile.allies = vec!["Green Coalition".to_string()];
        interests.profile.opponents = vec!["Oil Lobby".to_string()];
        interests.profile.embedding = Some(vec![1.0, 0.0, 0.0]);

        let candidate = Candidate {
            id: "cand-5".to_string(),
            topic: "Climate Change Summit".to_string(),
            title: "Climate Change Summit in Texas".to_string(),
            summary: Some(
                "Senator Jane Doe said Acme Corp, the Green Coalition and the Oil Lobby clashed"
                    .to_string(),
            ),
            velocity: 100.0,
            is_breaking: true,
            source_count: 9,
            embedding: Some(vec![1.0, 0.0, 0.0]),
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(candidate), now());

        assert_eq!(record.relevance_score, 100.0);
        assert_eq!(record.priority_bucket, PriorityBucket::High);
        assert!(record.is_allowlisted);
        assert_eq!(record.matched_geographies, vec!["Texas".to_string()]);
        assert_eq!(record.explanation.breakdown["outcome_learning"], 10.0);
        assert_eq!(record.explanation.breakdown["breakthrough_multiplier"], 1.2);
        assert_eq!(record.matched_stakeholders.len(), 3);
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let interests = org(&[("climate", 0.8), ("energy", 0.5)], vec![]);
        let first = engine.score_pair(&interests, &prepared(climate_candidate()), now());
        let second = engine.score_pair(&interests, &prepared(climate_candidate()), now());

        assert_eq!(first.relevance_score, second.relevance_score);
        assert_eq!(
            serde_json::to_string(&first.explanation.to_json()).unwrap(),
            serde_json::to_string(&second.explanation.to_json()).unwrap()
        );
    }

    #[test]
    fn test_profile_terms_used_when_no_topic_matches() {
        let aliases = fixture_snapshot();
        let weights = ScoringWeights::default();
        let engine = ScoringEngine::new(&weights, &aliases, Duration::hours(24));
        let mut interests = org(&[], vec![]);
        interests.profile.profile_loaded = true;
        interests.profile.priority_lanes = vec!["housing".to_string()];
        interests.profile.focus_areas = vec!["tenant rights".to_string(), "Housing".to_string()];
        interests.profile.key_issues = vec!["zoning".to_string()];
        let candidate = Candidate {
            id: "cand-6".to_string(),
            title: "City council debates housing and zoning reform".to_string(),
            ..Default::default()
        };
        let record = engine.score_pair(&interests, &prepared(candidate), now());

        assert_eq!(record.explanation.breakdown["profile_topic_match"], 25.0);
        assert_eq!(record.matched_topics, vec!["housing".to_string(), "zoning".to_string()]);
        assert_eq!(record.relevance_score, 25.0);
    }

    #[test]
    fn test_priority_bucket_boundaries() {
        assert_eq!(PriorityBucket::from_score(70.0), PriorityBucket::High);
        assert_eq!(PriorityBucket::from_score(65.0), PriorityBucket::High);
        assert_eq!(PriorityBucket::from_score(64.99), PriorityBucket::Medium);
        assert_eq!(PriorityBucket::from_score(50.0), PriorityBucket::Medium);
        assert_eq!(PriorityBucket::from_score(35.0), PriorityBucket::Medium);
        assert_eq!(PriorityBucket::from_score(34.99), PriorityBucket::Low);
        assert_eq!(PriorityBucket::from_score(20.0), PriorityBucket::Low);
    }

    #[test]
    fn test_urgency_score() {
        let weights = ScoringWeights::default();
        let calm = Candidate {
            velocity: 50.0,
            mentions_1h: 1,
            mentions_24h: 48,
            ..Default::default()
        };
        assert_eq!(urgency_score(&calm, &weights), 35.0);

        let surging = Candidate {
            velocity: 90.0,
            is_breaking: true,
            mentions_1h: 10,
            mentions_24h: 48,
            ..Default::default()
        };
        assert_eq!(urgency_score(&surging, &weights), 100.0);
    }

    #[test]
    fn test_velocity_and_semantic_curves() {
        let weights = ScoringWeights::default();
        assert_eq!(velocity_points(50.0, &weights), 0.0);
        assert_eq!(round2(velocity_points(60.0, &weights)), 3.0);
        assert_eq!(velocity_points(150.0, &weights), 15.0);
        assert_eq!(semantic_points(0.3, &weights), 0.0);
        assert_eq!(round2(semantic_points(0.9, &weights)), 20.0);
        assert_eq!(round2(semantic_points(0.99, &weights)), 20.0);
    }
}
