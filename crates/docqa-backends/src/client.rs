//! OpenAI-compatible inference client (llama.cpp server, Ollama, vLLM, ...)

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use docqa_core::{
    AnswerGenerator, Embedder, Error, GenerationConfig, GenerationResult, Result,
};

use crate::config::{base_url, InferenceConfig};

/// HTTP client for the embedding and completion endpoints
pub struct InferenceClient {
    config: InferenceConfig,
    generation: GenerationConfig,
    embeddings_url: Url,
    completions_url: Url,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stop: &'a [String],
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

#[derive(Deserialize)]
struct CompletionUsage {
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

impl InferenceClient {
    /// Create a new client from configuration
    pub fn new(config: InferenceConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self {
            embeddings_url: endpoint(&config.embed_url, "embedding", "v1/embeddings")?,
            completions_url: endpoint(&config.llm_url, "completion", "v1/completions")?,
            generation: config.generation(),
            config,
            client,
        })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(InferenceConfig::from_env()?)
    }

    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }

    fn post(&self, url: &Url) -> RequestBuilder {
        let request = self
            .client
            .post(url.clone())
            .header("Accept", "application/json");
        match &self.config.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn perform_completion(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let body = CompletionRequest {
            model: &config.model_id,
            prompt,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stop: &config.stop_sequences,
        };

        let response = self
            .post(&self.completions_url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response, "completion")
            .await
            .map_err(Error::LLMProvider)?;

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::LLMProvider("completion response had no choices".to_string()))?;

        Ok(GenerationResult {
            text: choice.text.trim().to_string(),
            model_id: config.model_id.clone(),
            tokens_used: data.usage.and_then(|u| u.total_tokens),
        })
    }
}

#[async_trait]
impl Embedder for InferenceClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let body = EmbeddingRequest {
            model: &self.config.embed_model,
            input: text,
        };

        let response = self
            .post(&self.embeddings_url)
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;
        let response = ensure_success(response, "embedding")
            .await
            .map_err(Error::Embedding)?;

        let data: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| Error::Embedding(format!("malformed embedding response: {}", e)))?;

        let embedding = data
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::Embedding("embedding response had no data".to_string()))?;

        if embedding.len() != self.config.embed_dim {
            return Err(Error::Embedding(format!(
                "model '{}' returned {} values, expected {}",
                self.config.embed_model,
                embedding.len(),
                self.config.embed_dim
            )));
        }

        debug!(dimension = embedding.len(), "embedded text");
        Ok(embedding)
    }

    fn dimension(&self) -> usize {
        self.config.embed_dim
    }

    fn model_id(&self) -> &str {
        &self.config.embed_model
    }
}

#[async_trait]
impl AnswerGenerator for InferenceClient {
    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        self.generate_with_config(prompt, &self.generation).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        let generation_future = self.perform_completion(prompt, config);

        match timeout(config.timeout, generation_future).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "completion did not finish within {}s",
                config.timeout.as_secs()
            ))),
        }
    }

    fn model_id(&self) -> &str {
        &self.generation.model_id
    }
}

fn endpoint(base: &str, what: &str, path: &str) -> Result<Url> {
    let mut url = base_url(base, what)?;
    if !url.path().ends_with('/') {
        let with_slash = format!("{}/", url.path());
        url.set_path(&with_slash);
    }
    url.join(path)
        .map_err(|e| Error::Configuration(format!("invalid {} endpoint: {}", what, e)))
}

fn network_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Network(err.to_string())
    }
}

/// Turn a non-2xx response into a message carrying its status and body
async fn ensure_success(
    response: Response,
    what: &str,
) -> std::result::Result<Response, String> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(format!("{} request failed with status {}: {}", what, status, body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let url = endpoint("http://localhost:8080", "embedding", "v1/embeddings").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/v1/embeddings");

        let url = endpoint("http://gpu-box/llama/", "completion", "v1/completions").unwrap();
        assert_eq!(url.as_str(), "http://gpu-box/llama/v1/completions");
    }

    #[test]
    fn test_completion_request_omits_unset_temperature() {
        let stop = vec!["</s>".to_string()];
        let body = CompletionRequest {
            model: "phi-2",
            prompt: "Q",
            max_tokens: 256,
            temperature: None,
            stop: &stop,
        };
        insta::assert_snapshot!(serde_json::to_string(&body).unwrap(), @r#"{"model":"phi-2","prompt":"Q","max_tokens":256,"stop":["</s>"]}"#);
    }
}
