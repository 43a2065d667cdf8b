//! Text extraction trait

use std::path::Path;

use crate::Result;

/// Trait for turning an uploaded document into plain text.
pub trait TextExtractor: Send + Sync {
    /// Extract text from a file on disk, dispatching on its extension
    fn extract_path(&self, path: &Path) -> Result<String>;

    /// Extract text from in-memory file contents with the given extension
    /// (with or without the leading dot, any case)
    fn extract_bytes(&self, bytes: &[u8], extension: &str) -> Result<String>;

    /// Extensions this extractor understands, lowercase with leading dot
    fn supported_extensions(&self) -> &[&'static str];
}
