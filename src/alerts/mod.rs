// src/alerts/mod.rs
pub mod classify;
pub mod db;
pub mod dedup;

pub use classify::{alert_key, AlertPolicy};
pub use dedup::{AlertDeduplicator, RecentAlert};
