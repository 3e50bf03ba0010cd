//! Error types for a relevance run.
//!
//! Only `UpstreamRead` ever reaches the caller. Write and embedding failures are
//! isolated to the batch or pair they occur in and are logged where they happen.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RelevanceError {
    #[error("Failed to read {source_name} from the reference store")]
    UpstreamRead {
        source_name: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error("Batch {batch_index} write to {table} failed: {reason}")]
    PartialWrite {
        table: &'static str,
        batch_index: usize,
        reason: String,
    },

    #[error("Malformed embedding: {0}")]
    MalformedEmbedding(String),
}

impl RelevanceError {
    pub fn upstream(source_name: &'static str, source: anyhow::Error) -> Self {
        RelevanceError::UpstreamRead {
            source_name,
            source,
        }
    }

    /// True if this error must abort the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, RelevanceError::UpstreamRead { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_upstream_reads_are_fatal() {
        let upstream = RelevanceError::upstream("candidates", anyhow::anyhow!("connection refused"));
        assert!(upstream.is_fatal());
        assert_eq!(
            upstream.to_string(),
            "Failed to read candidates from the reference store"
        );

        let write = RelevanceError::PartialWrite {
            table: "relevance_scores",
            batch_index: 2,
            reason: "deadlock".to_string(),
        };
        assert!(!write.is_fatal());
        assert_eq!(
            write.to_string(),
            "Batch 2 write to relevance_scores failed: deadlock"
        );

        assert!(!RelevanceError::MalformedEmbedding("NaN".into()).is_fatal());
    }
}
