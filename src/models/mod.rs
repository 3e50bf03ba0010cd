pub mod alerts;
pub mod core;
pub mod scoring;
pub mod stats_models;
