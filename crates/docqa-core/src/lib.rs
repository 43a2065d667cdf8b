//! Core traits and types for docqa
//!
//! This crate defines the collaborator interfaces that the retrieval pipeline
//! talks to: embedding models, answer generators, text extractors and speech
//! synthesizers.

pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod llm;
pub mod speech;
pub mod types;

pub use config::{env_lookup, parse_var, PipelineConfig};
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use extract::TextExtractor;
pub use llm::{AnswerGenerator, GenerationConfig, GenerationResult};
pub use speech::{SpeechCapability, SpeechSynthesizer};
pub use types::*;
