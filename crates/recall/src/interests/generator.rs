//! Single-prompt text generation
//!
//! The interest summary needs one plain completion, not a chat session,
//! so it goes through this narrow trait instead of the proxy engine.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::GenerationConfig;
use crate::error::{GatewayError, Result};

#[async_trait]
pub trait Generator: Send + Sync {
    /// Complete a single prompt and return the raw model output
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generator name for logging
    fn name(&self) -> &'static str;
}

/// Ollama's non-streaming `/api/generate` endpoint
#[derive(Debug)]
pub struct OllamaGenerator {
    client: Client,
    config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        info!(
            "OllamaGenerator initialized with model: {}, url: {}",
            config.model, config.url
        );

        Ok(Self {
            client,
            config: config.clone(),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.config.url.trim_end_matches('/'));
        let request = GenerateRequest {
            model: &self.config.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Calling generation endpoint at: {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                GatewayError::UpstreamFailure(format!("Failed to connect to Ollama at {url}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::UpstreamFailure(format!(
                "Ollama API error {status}: {error_text}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            GatewayError::UpstreamFailure(format!("Failed to parse Ollama response: {e}"))
        })?;

        Ok(body.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
