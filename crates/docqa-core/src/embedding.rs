//! Embedding model trait

use async_trait::async_trait;

use crate::Result;

/// Trait for embedding models (e.g., MiniLM served by llama.cpp, Ollama, etc.)
///
/// Implementations turn a piece of text into a fixed-length vector. A failed
/// call is an error for that text only; callers indexing many chunks skip
/// the chunk and keep going.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single piece of text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Length of the vectors this model produces
    fn dimension(&self) -> usize;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}
