// src/matching/synonyms.rs - Domain topic vocabulary used to widen recall
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::matching::text::normalize;

/// Topic → related terms. Recall over precision: the context gate and the
/// acceptance thresholds filter what this lets through.
static TOPIC_SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    let entries: [(&'static str, &'static [&'static str]); 20] = [
        ("climate", &["climate change", "global warming", "carbon emissions", "greenhouse gas", "net zero", "decarbonization"]),
        ("environment", &["pollution", "conservation", "epa", "clean water", "clean air", "wildlife"]),
        ("energy", &["renewable", "solar", "wind power", "oil and gas", "electric grid", "utilities"]),
        ("healthcare", &["health care", "medicaid", "medicare", "hospital", "public health", "insurance coverage"]),
        ("education", &["schools", "teachers", "students", "student loans", "curriculum", "school board"]),
        ("immigration", &["border", "asylum", "migrants", "refugees", "deportation", "visa"]),
        ("housing", &["affordable housing", "rent", "eviction", "homelessness", "zoning", "mortgage"]),
        ("labor", &["union", "workers", "minimum wage", "strike", "collective bargaining", "workforce"]),
        ("economy", &["inflation", "jobs report", "recession", "interest rates", "federal reserve", "unemployment"]),
        ("taxes", &["tax", "irs", "tax credit", "tax cuts", "revenue", "budget"]),
        ("civil rights", &["voting rights", "discrimination", "equality", "civil liberties", "aclu"]),
        ("voting", &["election", "ballot", "voter", "polling place", "redistricting", "turnout"]),
        ("gun policy", &["firearms", "gun control", "second amendment", "background checks", "shooting"]),
        ("criminal justice", &["policing", "prison", "sentencing", "bail reform", "incarceration"]),
        ("technology", &["artificial intelligence", "ai", "privacy", "data protection", "broadband", "big tech"]),
        ("agriculture", &["farm bill", "farmers", "crops", "usda", "food supply"]),
        ("food security", &["hunger", "snap", "food bank", "food insecurity", "nutrition"]),
        ("transportation", &["infrastructure", "transit", "highways", "rail", "airports"]),
        ("trade", &["tariffs", "exports", "imports", "trade deal", "supply chain"]),
        ("reproductive rights", &["abortion", "roe", "contraception", "planned parenthood", "reproductive health"]),
    ];
    entries.into_iter().collect()
});

/// The normalized topic followed by its related terms, deduplicated, order
/// preserved.
pub fn expand(topic: &str) -> Vec<String> {
    let normalized = normalize(topic);
    if normalized.is_empty() {
        return Vec::new();
    }
    let mut terms = vec![normalized.clone()];
    if let Some(related) = TOPIC_SYNONYMS.get(normalized.as_str()) {
        for term in related.iter() {
            let term = normalize(term);
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
    }
    terms
}

pub fn has_synonyms(topic: &str) -> bool {
    TOPIC_SYNONYMS.contains_key(normalize(topic).as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_known_topic() {
        let terms = expand("Climate");
        assert_eq!(terms[0], "climate");
        assert!(terms.contains(&"global warming".to_string()));
        assert!(has_synonyms("CLIMATE"));
    }

    #[test]
    fn test_expand_unknown_topic_is_just_the_topic() {
        assert_eq!(expand("Beekeeping Rules"), vec!["beekeeping rules".to_string()]);
        assert!(expand("  ").is_empty());
        assert!(!has_synonyms("beekeeping"));
    }
}
