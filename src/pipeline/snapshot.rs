// src/pipeline/snapshot.rs - Reference data loaded once per run
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use log::{debug, warn};
use std::collections::HashMap;
use tokio_postgres::Row as PgRow;

use crate::alerts::db::load_recent_alerts;
use crate::alerts::dedup::RecentAlert;
use crate::errors::RelevanceError;
use crate::feedback::db::load_outcome_correlations;
use crate::feedback::outcome::OutcomeIndex;
use crate::matching::canonical::AliasSnapshot;
use crate::matching::topics::PreparedCandidate;
use crate::models::core::{
    AliasEntry, Candidate, InterestEntity, InterestTopic, OrganizationInterests, OrganizationProfile,
    OutcomeCorrelation, RuleType,
};
use crate::utils::config::RelevanceConfig;
use crate::utils::db_connect::PgPool;
use crate::utils::logging::RunLogger;

/// Alert threshold for organizations whose profile does not set one.
pub const DEFAULT_ALERT_THRESHOLD: f64 = 65.0;

/// Raw rows as read from the reference store.
#[derive(Debug, Clone, Default)]
pub struct SnapshotInputs {
    pub profiles: Vec<OrganizationProfile>,
    pub topics: Vec<InterestTopic>,
    pub entities: Vec<InterestEntity>,
    pub aliases: Vec<AliasEntry>,
    pub candidates: Vec<Candidate>,
    pub correlations: Vec<OutcomeCorrelation>,
    pub recent_alerts: Vec<RecentAlert>,
}

/// Immutable view of everything a run evaluates. Shared read-only across the
/// evaluation workers.
#[derive(Debug)]
pub struct RunSnapshot {
    pub organizations: Vec<OrganizationInterests>,
    pub candidates: Vec<PreparedCandidate>,
    pub aliases: AliasSnapshot,
    pub outcomes: OutcomeIndex,
    pub recent_alerts: Vec<RecentAlert>,
    pub loaded_at: DateTime<Utc>,
}

impl RunSnapshot {
    /// Reads every reference source. Any read failure aborts the run.
    pub async fn load(
        pool: &PgPool,
        config: &RelevanceConfig,
        scope: Option<&[String]>,
        now: DateTime<Utc>,
        logger: &RunLogger,
    ) -> Result<Self, RelevanceError> {
        let profiles = load_organization_profiles(pool, scope)
            .await
            .map_err(|e| RelevanceError::upstream("organization profiles", e))?;
        logger.log_data_loaded(profiles.len(), "organization");

        let topics = load_interest_topics(pool, scope)
            .await
            .map_err(|e| RelevanceError::upstream("interest topics", e))?;
        let entities = load_interest_entities(pool, scope)
            .await
            .map_err(|e| RelevanceError::upstream("interest entities", e))?;
        logger.log_data_loaded(topics.len() + entities.len(), "interest rule");

        let aliases = load_alias_entries(pool, config.alias_snapshot_limit)
            .await
            .map_err(|e| RelevanceError::upstream("entity aliases", e))?;
        logger.log_data_loaded(aliases.len(), "alias");

        let candidates = load_candidates(pool, now - config.candidate_lookback())
            .await
            .map_err(|e| RelevanceError::upstream("trend candidates", e))?;
        logger.log_data_loaded(candidates.len(), "candidate");

        let correlations = load_outcome_correlations(pool, now - config.outcome_window(), scope)
            .await
            .map_err(|e| RelevanceError::upstream("outcome correlations", e))?;
        let recent_alerts = load_recent_alerts(pool, now - config.dedup_window(), scope)
            .await
            .map_err(|e| RelevanceError::upstream("recent alerts", e))?;
        logger.log_data_loaded(correlations.len(), "outcome correlation");
        logger.log_data_loaded(recent_alerts.len(), "recent alert");

        let snapshot = Self::assemble(
            SnapshotInputs {
                profiles,
                topics,
                entities,
                aliases,
                candidates,
                correlations,
                recent_alerts,
            },
            config.alias_snapshot_limit.max(0) as usize,
            config.outcome_window(),
            now,
        );
        for org in snapshot
            .organizations
            .iter()
            .filter(|o| o.is_configuration_missing())
        {
            logger.log_configuration_missing(org.organization_id());
        }
        Ok(snapshot)
    }

    /// Groups rules under their organization and prepares candidate text.
    /// Rules for organizations outside `profiles` are dropped.
    pub fn assemble(
        inputs: SnapshotInputs,
        alias_limit: usize,
        outcome_window: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let aliases = AliasSnapshot::from_entries(inputs.aliases, alias_limit);

        let mut topics_by_org: HashMap<String, Vec<InterestTopic>> = HashMap::new();
        for topic in inputs.topics {
            topics_by_org
                .entry(topic.organization_id.clone())
                .or_default()
                .push(topic);
        }
        let mut entities_by_org: HashMap<String, Vec<InterestEntity>> = HashMap::new();
        for entity in inputs.entities {
            entities_by_org
                .entry(entity.organization_id.clone())
                .or_default()
                .push(entity);
        }

        let mut organizations: Vec<OrganizationInterests> = inputs
            .profiles
            .into_iter()
            .map(|profile| {
                let topics = topics_by_org.remove(&profile.organization_id).unwrap_or_default();
                let entities = entities_by_org
                    .remove(&profile.organization_id)
                    .unwrap_or_default();
                OrganizationInterests {
                    profile,
                    topics,
                    entities,
                }
            })
            .collect();
        organizations.sort_by(|a, b| a.organization_id().cmp(b.organization_id()));

        let candidates = inputs
            .candidates
            .into_iter()
            .map(|candidate| PreparedCandidate::new(candidate, &aliases))
            .collect();

        Self {
            organizations,
            candidates,
            outcomes: OutcomeIndex::build(inputs.correlations, &aliases, now, outcome_window),
            aliases,
            recent_alerts: inputs.recent_alerts,
            loaded_at: now,
        }
    }
}

/// Candidate embeddings arrive as JSON arrays. Anything that is not a non-empty
/// array of finite numbers is rejected.
pub fn parse_embedding_json(value: &serde_json::Value) -> Result<Vec<f32>, RelevanceError> {
    let items = value
        .as_array()
        .ok_or_else(|| RelevanceError::MalformedEmbedding(format!("expected an array, got {}", value)))?;
    let vector = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64()
                .map(|v| v as f32)
                .ok_or_else(|| RelevanceError::MalformedEmbedding(format!("element {} is not a number", i)))
        })
        .collect::<Result<Vec<f32>, _>>()?;
    validate_embedding(vector)
}

pub fn validate_embedding(vector: Vec<f32>) -> Result<Vec<f32>, RelevanceError> {
    if vector.is_empty() {
        return Err(RelevanceError::MalformedEmbedding("empty vector".to_string()));
    }
    if let Some(i) = vector.iter().position(|v| !v.is_finite()) {
        return Err(RelevanceError::MalformedEmbedding(format!(
            "element {} is not finite",
            i
        )));
    }
    Ok(vector)
}

fn embedding_or_none(owner: &str, parsed: Result<Vec<f32>, RelevanceError>) -> Option<Vec<f32>> {
    match parsed {
        Ok(vector) => Some(vector),
        Err(e) => {
            warn!("{} for {}; treating it as absent", e, owner);
            None
        }
    }
}

fn text_array(row: &PgRow, column: &str) -> Vec<String> {
    row.get::<_, Option<Vec<String>>>(column)
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

async fn load_organization_profiles(
    pool: &PgPool,
    scope: Option<&[String]>,
) -> Result<Vec<OrganizationProfile>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_organization_profiles")?;

    const SELECT_SQL: &str = "
        SELECT o.id AS organization_id, o.name,
               p.organization_id IS NOT NULL AS profile_loaded,
               p.mission, p.focus_areas, p.key_issues, p.priority_lanes, p.geographies,
               p.stakeholders, p.allies, p.opponents, p.embedding, p.alert_threshold
        FROM public.organizations o
        LEFT JOIN public.organization_profiles p ON p.organization_id = o.id
        WHERE o.is_active
          AND ($1::TEXT[] IS NULL OR o.id = ANY($1))
        ORDER BY o.id";

    let scope: Option<Vec<String>> = scope.map(|ids| ids.to_vec());
    let rows = conn
        .query(SELECT_SQL, &[&scope])
        .await
        .context("Failed to query organizations with profiles")?;

    let profiles = rows
        .iter()
        .map(|row| {
            let organization_id: String = row.get("organization_id");
            let embedding = row
                .get::<_, Option<pgvector::Vector>>("embedding")
                .and_then(|v| embedding_or_none(&organization_id, validate_embedding(v.to_vec())));
            OrganizationProfile {
                name: row.get::<_, Option<String>>("name").unwrap_or_default(),
                mission: row.get("mission"),
                focus_areas: text_array(row, "focus_areas"),
                key_issues: text_array(row, "key_issues"),
                priority_lanes: text_array(row, "priority_lanes"),
                geographies: text_array(row, "geographies"),
                stakeholders: text_array(row, "stakeholders"),
                allies: text_array(row, "allies"),
                opponents: text_array(row, "opponents"),
                embedding,
                alert_threshold: row
                    .get::<_, Option<f64>>("alert_threshold")
                    .unwrap_or(DEFAULT_ALERT_THRESHOLD),
                profile_loaded: row.get("profile_loaded"),
                organization_id,
            }
        })
        .collect();
    Ok(profiles)
}

async fn load_interest_topics(pool: &PgPool, scope: Option<&[String]>) -> Result<Vec<InterestTopic>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_interest_topics")?;

    const SELECT_SQL: &str = "
        SELECT organization_id, topic, weight, source
        FROM public.organization_interest_topics
        WHERE ($1::TEXT[] IS NULL OR organization_id = ANY($1))
        ORDER BY organization_id, weight DESC, topic";

    let scope: Option<Vec<String>> = scope.map(|ids| ids.to_vec());
    let rows = conn
        .query(SELECT_SQL, &[&scope])
        .await
        .context("Failed to query organization_interest_topics")?;

    Ok(rows
        .iter()
        .map(|row| InterestTopic {
            organization_id: row.get("organization_id"),
            topic: row.get("topic"),
            weight: row.get::<_, Option<f64>>("weight").unwrap_or(1.0),
            source: row
                .get::<_, Option<String>>("source")
                .unwrap_or_else(|| "manual".to_string()),
        })
        .collect())
}

async fn load_interest_entities(pool: &PgPool, scope: Option<&[String]>) -> Result<Vec<InterestEntity>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_interest_entities")?;

    const SELECT_SQL: &str = "
        SELECT organization_id, entity_name, rule_type, reason, context_keywords
        FROM public.organization_interest_entities
        WHERE ($1::TEXT[] IS NULL OR organization_id = ANY($1))
        ORDER BY organization_id, rule_type, entity_name";

    let scope: Option<Vec<String>> = scope.map(|ids| ids.to_vec());
    let rows = conn
        .query(SELECT_SQL, &[&scope])
        .await
        .context("Failed to query organization_interest_entities")?;

    let mut entities = Vec::with_capacity(rows.len());
    for row in &rows {
        let raw_type: String = row.get("rule_type");
        let Some(rule_type) = RuleType::from_str_opt(&raw_type) else {
            warn!(
                "Skipping interest entity with unknown rule_type '{}' for org {}",
                raw_type,
                row.get::<_, String>("organization_id")
            );
            continue;
        };
        entities.push(InterestEntity {
            organization_id: row.get("organization_id"),
            entity_name: row.get("entity_name"),
            rule_type,
            reason: row.get("reason"),
            context_keywords: text_array(row, "context_keywords"),
        });
    }
    Ok(entities)
}

async fn load_alias_entries(pool: &PgPool, limit: i64) -> Result<Vec<AliasEntry>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_alias_entries")?;

    const SELECT_SQL: &str = "
        SELECT raw_name, canonical_name, entity_type, confidence, usage_count
        FROM public.entity_aliases
        ORDER BY usage_count DESC, raw_name
        LIMIT $1";

    let rows = conn
        .query(SELECT_SQL, &[&limit])
        .await
        .context("Failed to query entity_aliases")?;

    Ok(rows
        .iter()
        .map(|row| AliasEntry {
            raw_name: row.get("raw_name"),
            canonical_name: row.get("canonical_name"),
            entity_type: row
                .get::<_, Option<String>>("entity_type")
                .unwrap_or_else(|| "unknown".to_string()),
            confidence: row.get::<_, Option<f64>>("confidence").unwrap_or(1.0),
            usage_count: row.get::<_, Option<i64>>("usage_count").unwrap_or(0),
        })
        .collect())
}

async fn load_candidates(pool: &PgPool, since: DateTime<Utc>) -> Result<Vec<Candidate>> {
    let conn = pool
        .get()
        .await
        .context("Failed to get DB connection for load_candidates")?;

    const SELECT_SQL: &str = "
        SELECT id, topic, title, summary, keywords, entities, geographies,
               velocity, is_breaking, source_count, mentions_1h, mentions_24h,
               sentiment_delta, sample_sources, embedding, detected_at
        FROM public.trend_candidates
        WHERE detected_at >= $1
        ORDER BY detected_at DESC, id";

    let rows = conn
        .query(SELECT_SQL, &[&since])
        .await
        .context("Failed to query trend_candidates")?;

    let candidates: Vec<Candidate> = rows
        .iter()
        .map(|row| {
            let id: String = row.get("id");
            let embedding = row
                .get::<_, Option<serde_json::Value>>("embedding")
                .filter(|v| !v.is_null())
                .and_then(|v| embedding_or_none(&id, parse_embedding_json(&v)));
            Candidate {
                topic: row.get::<_, Option<String>>("topic").unwrap_or_default(),
                title: row.get::<_, Option<String>>("title").unwrap_or_default(),
                summary: row.get("summary"),
                keywords: text_array(row, "keywords"),
                entities: text_array(row, "entities"),
                geographies: text_array(row, "geographies"),
                velocity: row.get::<_, Option<f64>>("velocity").unwrap_or(0.0),
                is_breaking: row.get::<_, Option<bool>>("is_breaking").unwrap_or(false),
                source_count: row.get::<_, Option<i32>>("source_count").unwrap_or(0),
                mentions_1h: row.get::<_, Option<i32>>("mentions_1h").unwrap_or(0),
                mentions_24h: row.get::<_, Option<i32>>("mentions_24h").unwrap_or(0),
                sentiment_delta: row.get("sentiment_delta"),
                sample_sources: text_array(row, "sample_sources"),
                embedding,
                detected_at: row.get("detected_at"),
                id,
            }
        })
        .collect();
    debug!("Loaded {} candidates detected since {}", candidates.len(), since);
    Ok(candidates)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::matching::canonical::tests::alias;
    use chrono::TimeZone;
    use serde_json::json;

    pub(crate) fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
    }

    pub(crate) fn profile(id: &str, threshold: f64) -> OrganizationProfile {
        OrganizationProfile {
            organization_id: id.to_string(),
            name: id.to_uppercase(),
            alert_threshold: threshold,
            profile_loaded: true,
            ..Default::default()
        }
    }

    pub(crate) fn topic(org: &str, topic: &str, weight: f64) -> InterestTopic {
        InterestTopic {
            organization_id: org.to_string(),
            topic: topic.to_string(),
            weight,
            source: "manual".to_string(),
        }
    }

    #[test]
    fn test_assemble_groups_rules_by_org() {
        let snapshot = RunSnapshot::assemble(
            SnapshotInputs {
                profiles: vec![profile("org-b", 60.0), profile("org-a", 60.0)],
                topics: vec![
                    topic("org-a", "climate", 0.8),
                    topic("org-b", "housing", 1.0),
                    topic("org-zzz", "orphan", 1.0),
                ],
                aliases: vec![alias("EPA", "Environmental Protection Agency", "agency", 10)],
                candidates: vec![Candidate {
                    id: "c1".to_string(),
                    topic: "EPA".to_string(),
                    title: "EPA issues rule".to_string(),
                    ..Default::default()
                }],
                ..Default::default()
            },
            5000,
            Duration::days(7),
            now(),
        );

        let ids: Vec<&str> = snapshot.organizations.iter().map(|o| o.organization_id()).collect();
        assert_eq!(ids, vec!["org-a", "org-b"]);
        assert_eq!(snapshot.organizations[0].topics[0].topic, "climate");
        assert_eq!(snapshot.candidates[0].trend_key, "environmental protection agency");
        assert_eq!(snapshot.aliases.len(), 2);
    }

    #[test]
    fn test_configuration_missing_detection() {
        let mut bare = profile("org-c", 60.0);
        bare.profile_loaded = false;
        let snapshot = RunSnapshot::assemble(
            SnapshotInputs {
                profiles: vec![bare],
                ..Default::default()
            },
            5000,
            Duration::days(7),
            now(),
        );
        assert!(snapshot.organizations[0].is_configuration_missing());
    }

    #[test]
    fn test_parse_embedding_json() {
        assert_eq!(parse_embedding_json(&json!([0.5, -1, 2.25])).unwrap(), vec![0.5, -1.0, 2.25]);
        assert!(matches!(
            parse_embedding_json(&json!([])),
            Err(RelevanceError::MalformedEmbedding(_))
        ));
        assert!(parse_embedding_json(&json!([0.1, "x"])).is_err());
        assert!(parse_embedding_json(&json!({"v": [1.0]})).is_err());
        assert!(validate_embedding(vec![1.0, f32::NAN]).is_err());
        assert_eq!(embedding_or_none("c1", parse_embedding_json(&json!("nope"))), None);
    }
}
