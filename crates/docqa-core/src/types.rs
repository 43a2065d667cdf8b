//! Common types used across the docqa system

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Outcome of indexing one uploaded document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingReport {
    pub source: String,
    pub chunks_total: usize,
    pub chunks_indexed: usize,
    pub chunks_failed: usize,
    pub errors: Vec<String>,
    pub indexed_at: DateTime<Utc>,
}

impl IndexingReport {
    /// Status line shown to the user after a successful upload
    pub fn summary(&self) -> String {
        format!(
            "Uploaded & indexed {} chunks from '{}'.",
            self.chunks_indexed, self.source
        )
    }
}

/// An answer to a question, with the chunks it was grounded on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
    /// WAV file with the spoken answer, when speech is available
    pub audio: Option<PathBuf>,
}
