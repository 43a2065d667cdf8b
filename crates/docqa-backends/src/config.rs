//! Backend configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use docqa_core::{env_lookup, parse_var, Error, GenerationConfig, Result};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_EMBED_MODEL: &str = "sentence-transformers/paraphrase-MiniLM-L3-v2";
const DEFAULT_LLM_MODEL: &str = "phi-2";
const DEFAULT_PIPER_MODEL: &str = "app/models/tts/en_US-danny-low.onnx";

/// Configuration for the embedding and completion endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    pub embed_url: String,
    pub llm_url: String,
    pub embed_model: String,
    pub llm_model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub embed_dim: usize,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            embed_url: DEFAULT_BASE_URL.to_string(),
            llm_url: DEFAULT_BASE_URL.to_string(),
            embed_model: DEFAULT_EMBED_MODEL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            api_key: None,
            embed_dim: 384,
            max_tokens: 256,
            timeout_secs: 120,
        }
    }
}

impl InferenceConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            embed_url: lookup("DOCQA_EMBED_URL").unwrap_or(defaults.embed_url),
            llm_url: lookup("DOCQA_LLM_URL").unwrap_or(defaults.llm_url),
            embed_model: lookup("DOCQA_EMBED_MODEL").unwrap_or(defaults.embed_model),
            llm_model: lookup("DOCQA_LLM_MODEL").unwrap_or(defaults.llm_model),
            api_key: lookup("DOCQA_API_KEY"),
            embed_dim: parse_var(&lookup, "DOCQA_EMBED_DIM", defaults.embed_dim)?,
            max_tokens: parse_var(&lookup, "DOCQA_MAX_TOKENS", defaults.max_tokens)?,
            timeout_secs: parse_var(&lookup, "DOCQA_TIMEOUT_SECS", defaults.timeout_secs)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Override the endpoints, e.g. from command line flags
    pub fn with_urls(mut self, embed_url: Option<String>, llm_url: Option<String>) -> Result<Self> {
        if let Some(url) = embed_url {
            self.embed_url = url;
        }
        if let Some(url) = llm_url {
            self.llm_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        base_url(&self.embed_url, "embedding")?;
        base_url(&self.llm_url, "completion")?;
        if self.embed_dim == 0 {
            return Err(Error::Configuration(
                "DOCQA_EMBED_DIM must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Generation defaults derived from this configuration
    pub fn generation(&self) -> GenerationConfig {
        GenerationConfig {
            model_id: self.llm_model.clone(),
            max_tokens: self.max_tokens,
            timeout: self.timeout(),
            ..GenerationConfig::default()
        }
    }
}

/// Parse and check a backend base URL
pub(crate) fn base_url(raw: &str, what: &str) -> Result<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| {
        Error::Configuration(format!("invalid {} endpoint '{}': {}", what, raw, e))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::Configuration(format!(
            "{} endpoint '{}' must use http or https, not '{}'",
            what, raw, other
        ))),
    }
}

/// Where to find the Piper executable and voice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiperConfig {
    pub binary: PathBuf,
    pub model: PathBuf,
    pub config: PathBuf,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self::for_model(DEFAULT_PIPER_MODEL)
    }
}

impl PiperConfig {
    /// Voice at `model`, with its JSON config next to it
    pub fn for_model(model: impl Into<PathBuf>) -> Self {
        let model = model.into();
        let mut config = model.clone().into_os_string();
        config.push(".json");
        Self {
            binary: PathBuf::from("piper"),
            model,
            config: PathBuf::from(config),
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config =
            Self::for_model(lookup("PIPER_MODEL").unwrap_or_else(|| DEFAULT_PIPER_MODEL.to_string()));
        if let Some(binary) = lookup("PIPER_BINARY") {
            config.binary = PathBuf::from(binary);
        }
        if let Some(voice_config) = lookup("PIPER_CONFIG") {
            config.config = PathBuf::from(voice_config);
        }
        config
    }
}
