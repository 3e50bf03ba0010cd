// src/feedback/mod.rs
pub mod db;
pub mod outcome;

pub use outcome::{OutcomeBonus, OutcomeIndex};
