pub mod alerts;
pub mod errors;
pub mod feedback;
pub mod matching;
pub mod models;
pub mod pipeline;
pub mod scoring;
pub mod utils;
