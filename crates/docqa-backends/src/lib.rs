//! Model backends for docqa
//!
//! This crate provides the OpenAI-compatible HTTP implementation of the
//! `Embedder` and `AnswerGenerator` traits, and the Piper implementation of
//! `SpeechSynthesizer`.

mod client;
mod config;
mod piper;


pub use client::InferenceClient;
pub use config::{InferenceConfig, PiperConfig};
pub use piper::PiperSynthesizer;

// Re-export core types for convenience
pub use docqa_core::{
    AnswerGenerator, Embedder, Error, GenerationConfig, GenerationResult, Result,
    SpeechCapability, SpeechSynthesizer,
};
