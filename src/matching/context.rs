// src/matching/context.rs - Contextual disambiguation of candidate matches
use crate::matching::canonical::AliasSnapshot;
use crate::matching::text::normalize;
use crate::matching::topics::{match_entity, CandidateText, TermMatch, TierScores};
use crate::models::core::{InterestEntity, RuleType};

pub const EXCLUDED_CONFIDENCE: f64 = 0.2;
pub const CONFIRMED_CONFIDENCE: f64 = 0.9;
pub const DEFAULT_CONFIDENCE: f64 = 0.6;
pub const GEOGRAPHY_MISS_MULTIPLIER: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Person,
    Organization,
    Bill,
    Committee,
    Agency,
    Unknown,
}

impl EntityKind {
    pub fn from_type_str(entity_type: &str) -> Self {
        match entity_type.trim().to_lowercase().as_str() {
            "person" | "people" | "politician" => EntityKind::Person,
            "organization" | "organisation" | "org" | "company" => EntityKind::Organization,
            "bill" | "legislation" => EntityKind::Bill,
            "committee" => EntityKind::Committee,
            "agency" | "department" => EntityKind::Agency,
            _ => EntityKind::Unknown,
        }
    }

    fn vocabulary(&self) -> Option<(&'static [&'static str], &'static [&'static str])> {
        match self {
            EntityKind::Person => Some((PERSON_EXPECTED, PERSON_EXCLUDE)),
            EntityKind::Organization => Some((ORGANIZATION_EXPECTED, ORGANIZATION_EXCLUDE)),
            EntityKind::Bill => Some((BILL_EXPECTED, BILL_EXCLUDE)),
            EntityKind::Committee => Some((COMMITTEE_EXPECTED, COMMITTEE_EXCLUDE)),
            EntityKind::Agency => Some((AGENCY_EXPECTED, AGENCY_EXCLUDE)),
            EntityKind::Unknown => None,
        }
    }
}

const PERSON_EXPECTED: &[&str] = &[
    "senator", "sen", "representative", "rep", "congressman", "congresswoman", "governor",
    "mayor", "secretary", "minister", "president", "ceo", "said", "says", "told", "spokesperson",
];
const PERSON_EXCLUDE: &[&str] = &[
    "street", "avenue", "boulevard", "county", "bridge", "stadium", "university", "high school",
    "memorial", "park",
];

const ORGANIZATION_EXPECTED: &[&str] = &[
    "company", "corporation", "nonprofit", "organization", "group", "coalition", "announced",
    "ceo", "board", "shares", "members", "spokesperson",
];
const ORGANIZATION_EXCLUDE: &[&str] = &["river", "mountain", "lake", "hurricane", "wildfire"];

const BILL_EXPECTED: &[&str] = &[
    "bill", "act", "legislation", "amendment", "vote", "voted", "passed", "congress", "senate",
    "house", "lawmakers", "sponsor", "signed",
];
const BILL_EXCLUDE: &[&str] = &[
    "invoice", "utility bill", "restaurant", "tip", "dollar bill", "billboard", "payment due",
];

const COMMITTEE_EXPECTED: &[&str] = &[
    "committee", "subcommittee", "hearing", "chair", "chairman", "chairwoman", "markup",
    "testimony", "witnesses", "subpoena",
];
const COMMITTEE_EXCLUDE: &[&str] = &[
    "party planning", "homeowners association", "hoa", "prom", "olympic committee",
];

const AGENCY_EXPECTED: &[&str] = &[
    "agency", "department", "administration", "regulation", "regulators", "rule", "federal",
    "bureau", "enforcement", "guidance", "administrator",
];
const AGENCY_EXCLUDE: &[&str] = &[
    "travel agency", "talent agency", "modeling agency", "real estate agency", "ad agency",
];

#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub confidence: f64,
    pub excluded: bool,
    pub confirmed_by: Option<String>,
    pub geography_penalized: bool,
}

impl GateOutcome {
    pub fn is_valid(&self, min_confidence: f64) -> bool {
        !self.excluded && self.confidence >= min_confidence
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeographyCheck {
    pub declared: bool,
    pub matched: Vec<String>,
}

impl GeographyCheck {
    /// Confidence multiplier: declared geographies that the content never
    /// mentions weaken a match, they never reject it.
    pub fn factor(&self) -> f64 {
        if self.declared && self.matched.is_empty() {
            GEOGRAPHY_MISS_MULTIPLIER
        } else {
            1.0
        }
    }
}

pub fn check_geography(org_geographies: &[String], text: &CandidateText) -> GeographyCheck {
    let mut matched = Vec::new();
    let mut declared = false;
    for geography in org_geographies {
        let normalized = normalize(geography);
        if normalized.is_empty() {
            continue;
        }
        declared = true;
        if text.mentions(&normalized) || text.geographies.iter().any(|g| *g == normalized) {
            matched.push(geography.clone());
        }
    }
    GeographyCheck { declared, matched }
}

/// Entity-type plausibility. Exclude terms invalidate, expected terms or the
/// caller's context keywords confirm, everything else gets the default.
pub fn assess_entity(
    entity_type: &str,
    context_keywords: &[String],
    text: &CandidateText,
    geography: &GeographyCheck,
) -> GateOutcome {
    let kind = EntityKind::from_type_str(entity_type);
    let vocabulary = kind.vocabulary();

    if let Some((_, exclude)) = vocabulary {
        if let Some(term) = exclude.iter().find(|term| text.mentions(term)) {
            return GateOutcome {
                confidence: EXCLUDED_CONFIDENCE,
                excluded: true,
                confirmed_by: Some(term.to_string()),
                geography_penalized: false,
            };
        }
    }

    let keyword_hit = context_keywords
        .iter()
        .map(|k| normalize(k))
        .find(|k| text.mentions(k));
    let expected_hit = vocabulary.and_then(|(expected, _)| {
        expected
            .iter()
            .find(|term| text.mentions(term))
            .map(|term| term.to_string())
    });
    let confirmed_by = keyword_hit.or(expected_hit);

    let base = if confirmed_by.is_some() {
        CONFIRMED_CONFIDENCE
    } else {
        DEFAULT_CONFIDENCE
    };
    let factor = geography.factor();
    GateOutcome {
        confidence: base * factor,
        excluded: false,
        confirmed_by,
        geography_penalized: factor < 1.0,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DenyHit {
    pub entity_name: String,
    pub reason: Option<String>,
    pub matched: TermMatch,
}

/// First deny rule that textually matches the candidate. Deny rules are not
/// gated: any match is a veto.
pub fn find_deny_hit(
    rules: &[InterestEntity],
    text: &CandidateText,
    aliases: &AliasSnapshot,
    tiers: &TierScores,
) -> Option<DenyHit> {
    rules
        .iter()
        .filter(|rule| rule.rule_type == RuleType::Deny)
        .find_map(|rule| {
            match_entity(&rule.entity_name, text, aliases, tiers).map(|matched| DenyHit {
                entity_name: rule.entity_name.clone(),
                reason: rule.reason.clone(),
                matched,
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::canonical::tests::fixture_snapshot;
    use crate::models::core::Candidate;

    fn text_for(title: &str) -> CandidateText {
        let candidate = Candidate {
            id: "c".to_string(),
            title: title.to_string(),
            ..Default::default()
        };
        CandidateText::from_candidate(&candidate, &fixture_snapshot())
    }

    fn no_geo() -> GeographyCheck {
        GeographyCheck::default()
    }

    #[test]
    fn test_exclude_term_invalidates() {
        let text = text_for("Traffic closed on Jane Doe Memorial Bridge");
        let outcome = assess_entity("person", &[], &text, &no_geo());
        assert!(outcome.excluded);
        assert_eq!(outcome.confidence, EXCLUDED_CONFIDENCE);
        assert!(!outcome.is_valid(0.4));
    }

    #[test]
    fn test_expected_term_confirms() {
        let text = text_for("Senator Jane Doe said the vote is delayed");
        let outcome = assess_entity("person", &[], &text, &no_geo());
        assert_eq!(outcome.confidence, CONFIRMED_CONFIDENCE);
        assert_eq!(outcome.confirmed_by.as_deref(), Some("senator"));
    }

    #[test]
    fn test_context_keyword_confirms_unknown_type() {
        let text = text_for("Acme expands pipeline project");
        let outcome = assess_entity("unknown", &["pipeline".to_string()], &text, &no_geo());
        assert_eq!(outcome.confidence, CONFIRMED_CONFIDENCE);
        let outcome = assess_entity("unknown", &[], &text, &no_geo());
        assert_eq!(outcome.confidence, DEFAULT_CONFIDENCE);
        assert!(outcome.is_valid(0.4));
    }

    #[test]
    fn test_geography_lowers_but_never_rejects() {
        let text = text_for("Acme expands pipeline project");
        let geo = check_geography(&["Texas".to_string()], &text);
        assert!(geo.declared);
        assert!(geo.matched.is_empty());
        let outcome = assess_entity("organization", &[], &text, &geo);
        assert!((outcome.confidence - DEFAULT_CONFIDENCE * GEOGRAPHY_MISS_MULTIPLIER).abs() < 1e-9);
        assert!(outcome.geography_penalized);
        assert!(outcome.is_valid(0.4));
    }

    #[test]
    fn test_geography_matches_content() {
        let text = text_for("Texas lawmakers debate water bill");
        let geo = check_geography(&["Texas".to_string(), "Ohio".to_string()], &text);
        assert_eq!(geo.matched, vec!["Texas".to_string()]);
        assert_eq!(geo.factor(), 1.0);
        assert_eq!(check_geography(&[], &text).factor(), 1.0);
    }

    #[test]
    fn test_deny_hit() {
        let aliases = fixture_snapshot();
        let text = text_for("Acme Corp Faces Investigation");
        let rules = vec![
            InterestEntity {
                organization_id: "org".to_string(),
                entity_name: "Acme Corp".to_string(),
                rule_type: RuleType::Allow,
                reason: None,
                context_keywords: vec![],
            },
            InterestEntity {
                organization_id: "org".to_string(),
                entity_name: "ACME corp".to_string(),
                rule_type: RuleType::Deny,
                reason: Some("conflict of interest".to_string()),
                context_keywords: vec![],
            },
        ];
        let hit = find_deny_hit(&rules, &text, &aliases, &TierScores::default()).unwrap();
        assert_eq!(hit.entity_name, "ACME corp");
        assert_eq!(hit.reason.as_deref(), Some("conflict of interest"));
        assert!(find_deny_hit(&rules[..1], &text, &aliases, &TierScores::default()).is_none());
    }
}
