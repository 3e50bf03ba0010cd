// src/matching/topics.rs - Tiered topic and entity matching against a candidate
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::matching::canonical::AliasSnapshot;
use crate::matching::synonyms;
use crate::matching::text::{
    contains_phrase, fuzzy_token_overlap, levenshtein_ratio, normalize, tokenize,
    whole_word_similarity, MIN_OVERLAP_TOKEN_LEN,
};
use crate::models::core::Candidate;

/// Topic tokens shorter than this only count on an exact token hit.
const MIN_FUZZY_TOKEN_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    Exact,
    Alias,
    Fuzzy,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchTier::Exact => "exact",
            MatchTier::Alias => "alias",
            MatchTier::Fuzzy => "fuzzy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermMatch {
    /// The organization-side term as configured.
    pub term: String,
    /// What it matched in the candidate.
    pub matched_on: String,
    pub tier: MatchTier,
    pub score: f64,
}

impl TermMatch {
    fn new(term: &str, matched_on: &str, tier: MatchTier, score: f64) -> Self {
        Self {
            term: term.to_string(),
            matched_on: matched_on.to_string(),
            tier,
            score,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TierScores {
    pub exact: f64,
    pub alias: f64,
    pub fuzzy_threshold: f64,
}

impl Default for TierScores {
    fn default() -> Self {
        Self {
            exact: 1.0,
            alias: 0.95,
            fuzzy_threshold: 0.75,
        }
    }
}

/// Candidate text prepared once per run and reused for every organization.
#[derive(Debug, Clone, Default)]
pub struct CandidateText {
    pub normalized_content: String,
    pub tokens: HashSet<String>,
    /// (normalized raw, canonical key) for each extracted entity and the topic label.
    pub entity_keys: Vec<(String, String)>,
    pub topic_key: String,
    pub topic_canonical: String,
    pub geographies: Vec<String>,
}

impl CandidateText {
    pub fn from_candidate(candidate: &Candidate, aliases: &AliasSnapshot) -> Self {
        let content = candidate.content();
        let mut entity_keys: Vec<(String, String)> = candidate
            .entities
            .iter()
            .chain(std::iter::once(&candidate.topic))
            .map(|raw| (normalize(raw), aliases.canonical_key(raw)))
            .filter(|(raw, _)| !raw.is_empty())
            .collect();
        entity_keys.dedup();
        let topic_resolved = aliases.resolve(candidate.label());

        Self {
            normalized_content: normalize(&content),
            tokens: tokenize(&content, MIN_OVERLAP_TOKEN_LEN),
            entity_keys,
            topic_key: normalize(&topic_resolved.canonical),
            topic_canonical: topic_resolved.canonical,
            geographies: candidate.geographies.iter().map(|g| normalize(g)).collect(),
        }
    }

    pub fn mentions(&self, normalized_phrase: &str) -> bool {
        contains_phrase(&self.normalized_content, normalized_phrase)
    }

    fn has_entity_raw(&self, normalized: &str) -> bool {
        self.entity_keys.iter().any(|(raw, _)| raw == normalized)
    }

    fn has_entity_canonical(&self, canonical_key: &str) -> bool {
        self.topic_key == canonical_key
            || self.entity_keys.iter().any(|(_, canonical)| canonical == canonical_key)
    }
}

/// A candidate with its matching text and trend key computed once per run.
#[derive(Debug, Clone)]
pub struct PreparedCandidate {
    pub candidate: Candidate,
    pub text: CandidateText,
    pub trend_key: String,
}

impl PreparedCandidate {
    pub fn new(candidate: Candidate, aliases: &AliasSnapshot) -> Self {
        let text = CandidateText::from_candidate(&candidate, aliases);
        let trend_key = text.topic_key.clone();
        Self {
            candidate,
            text,
            trend_key,
        }
    }
}

/// Matches an interest topic (expanded with its synonyms) against the candidate.
pub fn match_topic(
    topic: &str,
    text: &CandidateText,
    aliases: &AliasSnapshot,
    tiers: &TierScores,
) -> Option<TermMatch> {
    let terms = synonyms::expand(topic);
    let primary = terms.first()?;

    if text.mentions(primary) || text.topic_key == *primary || text.has_entity_raw(primary) {
        return Some(TermMatch::new(topic, primary, MatchTier::Exact, tiers.exact));
    }

    let canonical_key = aliases.canonical_key(topic);
    if canonical_key != *primary
        && (text.mentions(&canonical_key) || text.has_entity_canonical(&canonical_key))
    {
        return Some(TermMatch::new(topic, &canonical_key, MatchTier::Alias, tiers.alias));
    }
    if let Some(term) = terms.iter().skip(1).find(|term| text.mentions(term)) {
        return Some(TermMatch::new(topic, term, MatchTier::Alias, tiers.alias));
    }

    let overlap = fuzzy_token_overlap(primary, &text.normalized_content);
    let per_token = token_fuzzy_score(primary, &text.tokens);
    let best = overlap.max(per_token);
    if best >= tiers.fuzzy_threshold {
        return Some(TermMatch::new(topic, primary, MatchTier::Fuzzy, best));
    }
    None
}

/// Matches a named entity (rule, stakeholder, ally, opponent) against the
/// candidate's text and extracted entities.
pub fn match_entity(
    name: &str,
    text: &CandidateText,
    aliases: &AliasSnapshot,
    tiers: &TierScores,
) -> Option<TermMatch> {
    let normalized = normalize(name);
    if normalized.is_empty() {
        return None;
    }

    if text.mentions(&normalized) || text.has_entity_raw(&normalized) {
        return Some(TermMatch::new(name, &normalized, MatchTier::Exact, tiers.exact));
    }

    let canonical_key = aliases.canonical_key(name);
    if text.mentions(&canonical_key) || text.has_entity_canonical(&canonical_key) {
        return Some(TermMatch::new(name, &canonical_key, MatchTier::Alias, tiers.alias));
    }

    let best = text
        .entity_keys
        .iter()
        .map(|(_, candidate_key)| {
            (candidate_key, whole_word_similarity(&canonical_key, candidate_key))
        })
        .fold(None, |best: Option<(&String, f64)>, (key, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((key, score)),
        });
    match best {
        Some((key, score)) if score >= tiers.fuzzy_threshold => {
            Some(TermMatch::new(name, key, MatchTier::Fuzzy, score))
        }
        _ => None,
    }
}

/// Mean over the topic's tokens of their best Levenshtein ratio against the
/// candidate tokens.
fn token_fuzzy_score(normalized_topic: &str, candidate_tokens: &HashSet<String>) -> f64 {
    let topic_tokens: Vec<&str> = normalized_topic
        .split_whitespace()
        .filter(|t| t.chars().count() >= MIN_OVERLAP_TOKEN_LEN)
        .collect();
    if topic_tokens.is_empty() || candidate_tokens.is_empty() {
        return 0.0;
    }

    let total: f64 = topic_tokens
        .iter()
        .map(|topic_token| {
            if candidate_tokens.contains(*topic_token) {
                return 1.0;
            }
            if topic_token.chars().count() < MIN_FUZZY_TOKEN_LEN {
                return 0.0;
            }
            candidate_tokens
                .iter()
                .map(|candidate_token| levenshtein_ratio(topic_token, candidate_token))
                .fold(0.0, f64::max)
        })
        .sum();
    total / topic_tokens.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::canonical::tests::fixture_snapshot;

    fn candidate(title: &str, entities: &[&str]) -> Candidate {
        Candidate {
            id: "c1".to_string(),
            topic: String::new(),
            title: title.to_string(),
            entities: entities.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_topic_exact_match() {
        let aliases = fixture_snapshot();
        let text = CandidateText::from_candidate(
            &candidate("Climate Change Summit Draws Record Crowds", &[]),
            &aliases,
        );
        let m = match_topic("climate", &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Exact);
        assert_eq!(m.score, 1.0);
        assert_eq!(m.term, "climate");
    }

    #[test]
    fn test_topic_synonym_match_is_alias_tier() {
        let aliases = fixture_snapshot();
        let text = CandidateText::from_candidate(
            &candidate("Global warming report alarms scientists", &[]),
            &aliases,
        );
        let m = match_topic("Climate", &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Alias);
        assert_eq!(m.matched_on, "global warming");
        assert_eq!(m.score, 0.95);
    }

    #[test]
    fn test_topic_fuzzy_match_on_plural() {
        let aliases = fixture_snapshot();
        let text =
            CandidateText::from_candidate(&candidate("New tariffs hit steel imports", &[]), &aliases);
        let m = match_topic("tariff", &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Fuzzy);
        assert!(m.score >= 0.75 && m.score < 1.0);
    }

    #[test]
    fn test_topic_no_match() {
        let aliases = fixture_snapshot();
        let text =
            CandidateText::from_candidate(&candidate("Local team wins championship", &[]), &aliases);
        assert!(match_topic("housing", &text, &aliases, &TierScores::default()).is_none());
    }

    #[test]
    fn test_fuzzy_threshold_is_configurable() {
        let aliases = fixture_snapshot();
        let text =
            CandidateText::from_candidate(&candidate("New tariffs hit steel imports", &[]), &aliases);
        let strict = TierScores {
            fuzzy_threshold: 0.95,
            ..Default::default()
        };
        assert!(match_topic("tariff", &text, &aliases, &strict).is_none());
    }

    #[test]
    fn test_entity_alias_match() {
        let aliases = fixture_snapshot();
        let text = CandidateText::from_candidate(
            &candidate("Agency proposes new rule on methane", &["EPA"]),
            &aliases,
        );
        let m = match_entity(
            "Environmental Protection Agency",
            &text,
            &aliases,
            &TierScores::default(),
        )
        .unwrap();
        assert_eq!(m.tier, MatchTier::Alias);
        assert_eq!(m.matched_on, "environmental protection agency");
    }

    #[test]
    fn test_entity_exact_text_match() {
        let aliases = fixture_snapshot();
        let text =
            CandidateText::from_candidate(&candidate("Acme Corp Faces Investigation", &[]), &aliases);
        let m = match_entity("Acme Corp", &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Exact);
        assert!(match_entity("Globex", &text, &aliases, &TierScores::default()).is_none());
    }

    #[test]
    fn test_entity_fuzzy_match_on_extracted_entity() {
        let aliases = fixture_snapshot();
        let text = CandidateText::from_candidate(
            &candidate("Statement issued late Friday", &["Acme Corp Holdings", "Acme Crop"]),
            &aliases,
        );
        let m = match_entity("Acme Corp", &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Fuzzy);
        assert_eq!(m.score, 0.9);
        assert_eq!(m.matched_on, "acme corp holdings");

        let typo_only = CandidateText::from_candidate(
            &candidate("Statement issued late Friday", &["Acme Crop"]),
            &aliases,
        );
        let m = match_entity("Acme Corp", &typo_only, &aliases, &TierScores::default()).unwrap();
        assert_eq!(m.tier, MatchTier::Fuzzy);
        assert!(m.score >= 0.75 && m.score < 0.9);
    }

    #[test]
    fn test_entity_inside_longer_word_does_not_match() {
        let aliases = fixture_snapshot();
        let text = CandidateText::from_candidate(
            &candidate("Stanford University research breakthrough", &["Stanford University"]),
            &aliases,
        );
        let tiers = TierScores::default();
        assert!(match_entity("Ford", &text, &aliases, &tiers).is_none());
        assert!(match_entity("Stanford", &text, &aliases, &tiers).is_some());
    }
}
