
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::OllamaConfig;
use crate::embeddings::Embedder;
use crate::http::{RawResponse, build_agent, read_response, run_blocking};

#[derive(Debug, Clone)]
pub struct OllamaClient {
    base_url: Url,
    model: String,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl OllamaClient {
    #[inline]
    pub fn new(config: &OllamaConfig) -> Result<Self> {
        let base_url = config
            .ollama_url()
            .context("Failed to generate Ollama URL from config")?;

        Ok(Self {
            base_url,
            model: config.model.clone(),
            agent: build_agent(config.timeout()?),
        })
    }

    /// Test connection to Ollama server and verify model availability
    #[inline]
    pub fn health_check(&self) -> Result<()> {
        debug!("Performing health check for Ollama at {}", self.base_url);

        self.validate_model().context("Model validation failed")?;

        info!(
            "Health check passed for Ollama server at {} with model {}",
            self.base_url, self.model
        );
        Ok(())
    }

    /// Validate that the configured model is available
    #[inline]
    pub fn validate_model(&self) -> Result<()> {
        debug!("Validating model: {}", self.model);

        let models = self.list_models().context("Failed to list models")?;

        // Ollama reports untagged models with an explicit `:latest`
        let tagged = format!("{}:latest", self.model);
        if models
            .iter()
            .any(|m| m.name == self.model || m.name == tagged)
        {
            debug!("Model {} is available", self.model);
            Ok(())
        } else {
            let available_models: Vec<&str> = models.iter().map(|m| m.name.as_str()).collect();
            warn!(
                "Model {} not found. Available models: {:?}",
                self.model, available_models
            );
            Err(anyhow!(
                "Model '{}' is not available. Available models: {:?}",
                self.model,
                available_models
            ))
        }
    }

    /// List all available models
    #[inline]
    pub fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = self
            .base_url
            .join("/api/tags")
            .context("Failed to build models URL")?;

        debug!("Fetching available models from {}", url);

        let response = read_response(self.agent.get(url.as_str()).call(), "Ollama tags")?;
        let body = success_body(response)?;

        let models_response: ModelsResponse =
            serde_json::from_str(&body).context("Failed to parse models response")?;

        debug!("Found {} models", models_response.models.len());
        Ok(models_response.models)
    }

    /// Generate the embedding for a single text input
    #[inline]
    pub fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        debug!("Generating embedding for text (length: {})", text.len());

        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };

        let url = self
            .base_url
            .join("/api/embed")
            .context("Failed to build embedding URL")?;

        let request_json =
            serde_json::to_string(&request).context("Failed to serialize embedding request")?;

        let response = read_response(
            self.agent
                .post(url.as_str())
                .header("Content-Type", "application/json")
                .send(&request_json),
            "Ollama embed",
        )?;
        let body = success_body(response).context("Failed to generate embedding")?;

        let embed_response: EmbedResponse =
            serde_json::from_str(&body).context("Failed to parse embedding response")?;

        let embedding = embed_response
            .embeddings
            .into_iter()
            .next()
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| anyhow!("Ollama returned no embedding for model {}", self.model))?;

        debug!("Generated embedding with {} dimensions", embedding.len());
        Ok(embedding)
    }
}

fn success_body(response: RawResponse) -> Result<String> {
    if response.is_success() {
        return Ok(response.body);
    }

    match serde_json::from_str::<ErrorResponse>(&response.body) {
        Ok(error) => Err(anyhow!(
            "Ollama error (HTTP {}): {}",
            response.status,
            error.error
        )),
        Err(_) => Err(anyhow!("Ollama request failed with HTTP {}", response.status)),
    }
}

#[async_trait]
impl Embedder for OllamaClient {
    async fn embed(&self, text: &str) -> crate::Result<Vec<f32>> {
        let client = self.clone();
        let text = text.to_string();
        run_blocking(move || client.generate_embedding(&text)).await
    }
}
