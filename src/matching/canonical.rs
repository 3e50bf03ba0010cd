// src/matching/canonical.rs - Alias snapshot and entity canonicalization
use log::debug;
use std::collections::HashMap;

use crate::matching::text::{normalize, title_case};
use crate::models::core::AliasEntry;

pub const UNKNOWN_ENTITY_TYPE: &str = "unknown";
const FALLBACK_CONFIDENCE: f64 = 0.5;
const SELF_REGISTERED_CONFIDENCE: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub canonical: String,
    pub entity_type: String,
    pub confidence: f64,
    pub from_alias: bool,
}

/// Immutable alias table loaded once per run and shared by reference.
///
/// Keys are normalized raw names. Every canonical name is also a key that maps
/// to itself and alias chains are collapsed at construction, so
/// `resolve(resolve(x).canonical) == resolve(x)` for every `x`.
#[derive(Debug, Clone, Default)]
pub struct AliasSnapshot {
    entries: HashMap<String, AliasEntry>,
}

impl AliasSnapshot {
    /// Builds a snapshot from the `limit` most used entries.
    pub fn from_entries(mut raw_entries: Vec<AliasEntry>, limit: usize) -> Self {
        raw_entries.sort_by(|a, b| {
            b.usage_count
                .cmp(&a.usage_count)
                .then_with(|| a.raw_name.cmp(&b.raw_name))
        });
        raw_entries.truncate(limit);

        let mut entries: HashMap<String, AliasEntry> = HashMap::new();
        for entry in raw_entries {
            let key = normalize(&entry.raw_name);
            if key.is_empty() || normalize(&entry.canonical_name).is_empty() {
                continue;
            }
            // Highest usage wins when two raw spellings normalize the same.
            entries.entry(key).or_insert(entry);
        }

        let collapsed = collapse_chains(&entries);
        for (key, (canonical, entity_type)) in collapsed {
            if let Some(entry) = entries.get_mut(&key) {
                entry.canonical_name = canonical;
                entry.entity_type = entity_type;
            }
        }

        let mut canonicals: Vec<(String, String)> = entries
            .values()
            .map(|e| (e.canonical_name.clone(), e.entity_type.clone()))
            .collect();
        canonicals.sort();
        for (canonical, entity_type) in canonicals {
            let key = normalize(&canonical);
            entries.entry(key).or_insert_with(|| AliasEntry {
                raw_name: canonical.clone(),
                canonical_name: canonical,
                entity_type,
                confidence: SELF_REGISTERED_CONFIDENCE,
                usage_count: 0,
            });
        }

        // Canonicals that differ only in case point at whichever spelling owns
        // the normalized key.
        let rewrites: Vec<(String, String)> = entries
            .iter()
            .filter_map(|(key, entry)| {
                let owner = entries.get(&normalize(&entry.canonical_name))?;
                if owner.canonical_name != entry.canonical_name {
                    Some((key.clone(), owner.canonical_name.clone()))
                } else {
                    None
                }
            })
            .collect();
        for (key, canonical) in rewrites {
            if let Some(entry) = entries.get_mut(&key) {
                entry.canonical_name = canonical;
            }
        }

        debug!("Alias snapshot built with {} keys", entries.len());
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, name: &str) -> ResolvedEntity {
        let normalized = normalize(name);
        if normalized.is_empty() {
            return ResolvedEntity {
                canonical: String::new(),
                entity_type: UNKNOWN_ENTITY_TYPE.to_string(),
                confidence: 0.0,
                from_alias: false,
            };
        }
        match self.entries.get(&normalized) {
            Some(entry) => ResolvedEntity {
                canonical: entry.canonical_name.clone(),
                entity_type: entry.entity_type.clone(),
                confidence: entry.confidence,
                from_alias: normalize(&entry.canonical_name) != normalized,
            },
            None => ResolvedEntity {
                canonical: title_case(&normalized),
                entity_type: UNKNOWN_ENTITY_TYPE.to_string(),
                confidence: FALLBACK_CONFIDENCE,
                from_alias: false,
            },
        }
    }

    /// Normalized canonical form, used as a join key.
    pub fn canonical_key(&self, name: &str) -> String {
        normalize(&self.resolve(name).canonical)
    }
}

/// Follows raw → canonical links until a canonical that is not itself an alias
/// of something else. Cycles resolve to the canonical of their smallest key.
fn collapse_chains(entries: &HashMap<String, AliasEntry>) -> HashMap<String, (String, String)> {
    let mut result = HashMap::with_capacity(entries.len());
    for start in entries.keys() {
        let mut visited: Vec<String> = Vec::new();
        let mut key = start.clone();
        let terminal = loop {
            let entry = match entries.get(&key) {
                Some(entry) => entry,
                None => break None,
            };
            visited.push(key.clone());
            let next = normalize(&entry.canonical_name);
            if next == key || !entries.contains_key(&next) {
                break Some(entry);
            }
            if let Some(pos) = visited.iter().position(|k| *k == next) {
                let cycle_min = visited[pos..].iter().min().cloned();
                break cycle_min.and_then(|k| entries.get(&k));
            }
            key = next;
        };

        if let (Some(terminal), Some(original)) = (terminal, entries.get(start)) {
            let entity_type = if terminal.entity_type == UNKNOWN_ENTITY_TYPE {
                original.entity_type.clone()
            } else {
                terminal.entity_type.clone()
            };
            result.insert(start.clone(), (terminal.canonical_name.clone(), entity_type));
        }
    }
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn alias(raw: &str, canonical: &str, entity_type: &str, usage: i64) -> AliasEntry {
        AliasEntry {
            raw_name: raw.to_string(),
            canonical_name: canonical.to_string(),
            entity_type: entity_type.to_string(),
            confidence: 0.9,
            usage_count: usage,
        }
    }

    pub(crate) fn fixture_snapshot() -> AliasSnapshot {
        AliasSnapshot::from_entries(
            vec![
                alias("GOP", "Republican Party", "organization", 50),
                alias("EPA", "Environmental Protection Agency", "agency", 40),
                alias("U.S. EPA", "EPA", "agency", 10),
                alias("National Aeronautics and Space Administration", "NASA", "agency", 30),
                alias("Nasa", "Nasa", "agency", 1),
                alias("Sen. Doe", "Jane Doe", "person", 20),
                alias("Jane Doe", "Senator Jane Doe", "person", 15),
                alias("H.R. 1", "For the People Act", "bill", 12),
                alias("alpha", "beta", "organization", 5),
                alias("beta", "alpha", "organization", 5),
            ],
            1000,
        )
    }

    #[test]
    fn test_resolve_hits_alias_table() {
        let snapshot = fixture_snapshot();
        let gop = snapshot.resolve("the GOP");
        assert_eq!(gop.canonical, "The Gop");
        assert_eq!(gop.entity_type, UNKNOWN_ENTITY_TYPE);

        let gop = snapshot.resolve("G.O.P.");
        assert_eq!(gop.canonical, "Republican Party");
        assert_eq!(gop.entity_type, "organization");
        assert!(gop.from_alias);
    }

    #[test]
    fn test_resolve_falls_back_to_title_case() {
        let snapshot = fixture_snapshot();
        let resolved = snapshot.resolve("  acme   corp. ");
        assert_eq!(resolved.canonical, "Acme Corp");
        assert_eq!(resolved.entity_type, UNKNOWN_ENTITY_TYPE);
        assert!(!resolved.from_alias);
    }

    #[test]
    fn test_chains_are_collapsed() {
        let snapshot = fixture_snapshot();
        assert_eq!(snapshot.resolve("U.S. EPA").canonical, "Environmental Protection Agency");
        assert_eq!(snapshot.resolve("Sen. Doe").canonical, "Senator Jane Doe");
        assert_eq!(snapshot.resolve("Sen. Doe").entity_type, "person");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let snapshot = fixture_snapshot();
        let inputs = [
            "GOP",
            "Republican Party",
            "u.s. epa",
            "EPA",
            "NASA",
            "nasa",
            "National Aeronautics and Space Administration",
            "Sen. Doe",
            "Jane Doe",
            "H.R. 1",
            "alpha",
            "beta",
            "some unknown group",
            "ßtadt",
            "Straße ıstanbul",
            "",
        ];
        for input in inputs.iter() {
            let first = snapshot.resolve(input).canonical;
            let second = snapshot.resolve(&first).canonical;
            assert_eq!(first, second, "resolve not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_snapshot_is_bounded_by_usage() {
        let snapshot = AliasSnapshot::from_entries(
            vec![
                alias("rarely used", "Rare Canonical", "organization", 1),
                alias("often used", "Common Canonical", "organization", 100),
            ],
            1,
        );
        assert_eq!(snapshot.resolve("often used").canonical, "Common Canonical");
        assert_eq!(snapshot.resolve("rarely used").canonical, "Rarely Used");
    }
}
