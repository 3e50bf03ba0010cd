// src/scoring/mod.rs
pub mod engine;
pub mod weights;

pub use engine::{urgency_score, ScoringEngine, NO_MATCH_REASON};
pub use weights::ScoringWeights;
