// src/matching/mod.rs
pub mod canonical;
pub mod context;
pub mod synonyms;
pub mod text;
pub mod topics;

pub use canonical::{AliasSnapshot, ResolvedEntity};
pub use text::{cosine_similarity, fuzzy_token_overlap, levenshtein, normalize, similarity};
pub use topics::{CandidateText, MatchTier, PreparedCandidate, TermMatch, TierScores};
