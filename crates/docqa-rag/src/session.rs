//! Per-user document session

use chrono::{DateTime, Utc};

use crate::index::{FlatL2, NeighborBackend, VectorIndex};
use docqa_core::Result;

/// Single-owner handle over the index of the currently loaded document.
///
/// Ingestion takes `&mut Session`, queries take `&Session`; sharing one across
/// tasks means wrapping it in a lock.
pub struct Session<B: NeighborBackend = FlatL2> {
    index: VectorIndex<B>,
    source: Option<String>,
    loaded_at: Option<DateTime<Utc>>,
}

impl Session<FlatL2> {
    /// Create an empty session for `dimension`-length embeddings
    pub fn new(dimension: usize) -> Result<Self> {
        Ok(Self::with_index(VectorIndex::new(dimension)?))
    }
}

impl<B: NeighborBackend> Session<B> {
    pub fn with_index(index: VectorIndex<B>) -> Self {
        Self {
            index,
            source: None,
            loaded_at: None,
        }
    }

    pub fn index(&self) -> &VectorIndex<B> {
        &self.index
    }

    pub(crate) fn index_mut(&mut self) -> &mut VectorIndex<B> {
        &mut self.index
    }

    /// Forget the current document
    pub fn clear(&mut self) {
        self.index.reset();
        self.source = None;
        self.loaded_at = None;
    }

    pub(crate) fn mark_loaded(&mut self, source: &str, at: DateTime<Utc>) {
        self.source = Some(source.to_string());
        self.loaded_at = Some(at);
    }

    /// Name of the indexed document, if one is loaded
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn is_ready(&self) -> bool {
        self.index.is_ready()
    }

    pub fn chunk_count(&self) -> usize {
        self.index.len()
    }
}
