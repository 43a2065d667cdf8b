//! Retrieval-augmented question answering over a single uploaded document
//!
//! This crate provides the chunker, the vector index wrapper, the per-user
//! session and the pipeline that ties them to the embedding and generation
//! backends.

pub mod chunker;
pub mod index;
mod pipeline;
mod session;


pub use chunker::{split_text, DEFAULT_MAX_TOKENS};
pub use index::{FlatL2, IndexScalar, NeighborBackend, SearchHit, VectorIndex};
pub use pipeline::{build_prompt, truncate_context, RetrievalPipeline};
pub use session::Session;

// Re-export core types for convenience
pub use docqa_core::{
    Answer, AnswerGenerator, Embedder, Error, IndexingReport, PipelineConfig, Result,
    SpeechCapability, SpeechSynthesizer, TextExtractor,
};
