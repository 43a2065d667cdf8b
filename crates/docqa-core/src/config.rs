//! Environment-driven configuration helpers

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::{Error, Result};

/// Look a variable up in the process environment (after `.env` loading)
pub fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse `key` with `lookup`, falling back to `default` when unset.
///
/// A value that is present but unparsable is a configuration error, not a
/// silent fallback.
pub fn parse_var<T, F>(lookup: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| {
            Error::Configuration(format!("{} has invalid value '{}': {}", key, raw, e))
        }),
        None => Ok(default),
    }
}

/// Tunables for chunking and retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_chunk_tokens: usize,
    pub top_k: usize,
    pub max_context_chars: usize,
    pub context_separator: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_chunk_tokens: 500,
            top_k: 3,
            max_context_chars: 2500,
            context_separator: "\n\n---\n\n".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_chunk_tokens: parse_var(&lookup, "DOCQA_CHUNK_TOKENS", defaults.max_chunk_tokens)?,
            top_k: parse_var(&lookup, "DOCQA_TOP_K", defaults.top_k)?,
            max_context_chars: parse_var(
                &lookup,
                "DOCQA_MAX_CONTEXT_CHARS",
                defaults.max_context_chars,
            )?,
            context_separator: defaults.context_separator,
        };

        if config.max_chunk_tokens == 0 {
            return Err(Error::Configuration(
                "DOCQA_CHUNK_TOKENS must be greater than zero".to_string(),
            ));
        }
        if config.top_k == 0 {
            return Err(Error::Configuration(
                "DOCQA_TOP_K must be greater than zero".to_string(),
            ));
        }

        Ok(config)
    }
}
