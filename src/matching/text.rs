// src/matching/text.rs - Shared pure string/vector matching primitives
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tokens this short are ignored by token-overlap matching.
pub const MIN_OVERLAP_TOKEN_LEN: usize = 3;

const SEPARATOR_CHARS: [char; 6] = ['-', '/', '_', '|', '\\', '+'];

static POSSESSIVE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w)['’]s\b").expect("possessive pattern is valid"));

/// Lowercase, drop possessives and punctuation, collapse whitespace.
/// `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(input: &str) -> String {
    let lowered = input.to_lowercase();
    let without_possessives = POSSESSIVE_REGEX.replace_all(&lowered, "$1");
    let cleaned: String = without_possessives
        .chars()
        .map(|c| if SEPARATOR_CHARS.contains(&c) { ' ' } else { c })
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Capitalizes the first letter of every word of an already-normalized string.
/// A word whose capitalized form would not normalize back to itself (`ß` to
/// `SS`, dotless `ı` to `I`) is kept as is, so `normalize(title_case(x)) == x`.
pub fn title_case(normalized: &str) -> String {
    normalized
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            let titled = match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            };
            if normalize(&titled) == word {
                titled
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn tokenize(text: &str, min_len: usize) -> HashSet<String> {
    normalize(text)
        .split_whitespace()
        .filter(|t| t.chars().count() >= min_len)
        .map(|t| t.to_string())
        .collect()
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// `1 - levenshtein / max(len)` on chars. Two empty strings are identical.
pub fn levenshtein_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

/// Symmetric name similarity: 1.0 on normalized equality, 0.9 when one contains
/// the other, otherwise the Levenshtein ratio.
pub fn similarity(a: &str, b: &str) -> f64 {
    similarity_with(a, b, |haystack, needle| haystack.contains(needle))
}

/// `similarity` where containment only counts on word boundaries, so "ford"
/// is not part of "stanford university". Used for named entities.
pub fn whole_word_similarity(a: &str, b: &str) -> f64 {
    similarity_with(a, b, contains_phrase)
}

fn similarity_with(a: &str, b: &str, contains: impl Fn(&str, &str) -> bool) -> f64 {
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a == norm_b {
        return 1.0;
    }
    if norm_a.is_empty() || norm_b.is_empty() {
        return 0.0;
    }
    if contains(&norm_a, &norm_b) || contains(&norm_b, &norm_a) {
        return 0.9;
    }
    levenshtein_ratio(&norm_a, &norm_b)
}

/// Share of `topic`'s tokens (longer than two chars) that also occur in `text`.
pub fn fuzzy_token_overlap(topic: &str, text: &str) -> f64 {
    let topic_tokens = tokenize(topic, MIN_OVERLAP_TOKEN_LEN);
    if topic_tokens.is_empty() {
        return 0.0;
    }
    let text_tokens = tokenize(text, MIN_OVERLAP_TOKEN_LEN);
    let shared = topic_tokens.intersection(&text_tokens).count();
    shared as f64 / topic_tokens.len() as f64
}

/// Whole-word phrase containment over normalized strings.
pub fn contains_phrase(normalized_haystack: &str, normalized_phrase: &str) -> bool {
    if normalized_phrase.is_empty() || normalized_haystack.is_empty() {
        return false;
    }
    format!(" {} ", normalized_haystack).contains(&format!(" {} ", normalized_phrase))
}

/// Cosine similarity that never fails: missing, mismatched, empty or zero
/// vectors all score 0.0.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (v1, v2) = match (a, b) {
        (Some(v1), Some(v2)) if v1.len() == v2.len() && !v1.is_empty() => (v1, v2),
        _ => return 0.0,
    };

    let mut dot = 0.0f64;
    let mut mag1 = 0.0f64;
    let mut mag2 = 0.0f64;
    for (x, y) in v1.iter().zip(v2.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag1 += x * x;
        mag2 += y * y;
    }
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }

    let similarity = dot / (mag1.sqrt() * mag2.sqrt());
    if similarity.is_nan() || similarity.is_infinite() {
        log::warn!(
            "Cosine similarity is NaN or infinite (dot={}, mag1={}, mag2={}); treating as 0",
            dot,
            mag1,
            mag2
        );
        return 0.0;
    }
    similarity.clamp(-1.0, 1.0)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
