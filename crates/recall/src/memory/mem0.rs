//! mem0-compatible REST memory server client
//!
//! Talks to a mem0 server over HTTP. Extraction, embedding and ranking all
//! happen on the server; this client only maps the store contract onto its
//! routes.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::StoreConfig;
use crate::error::{GatewayError, Result};
use crate::memory::store::MemoryStore;
use crate::memory::types::{AddOutcome, MemoryEntry, MemoryEvent, Metadata, NewMemory};

#[derive(Debug, Clone)]
pub struct Mem0Store {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Serialize)]
struct AddRequest<'a> {
    messages: Vec<Message<'a>>,
    user_id: &'a str,
    metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateRequest<'a> {
    text: &'a str,
}

/// List responses come wrapped in `{"results": [...]}` on current servers
/// and as a bare array on older ones.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Wrapped { results: Vec<T> },
    Bare(Vec<T>),
}

impl<T> Listing<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Listing::Wrapped { results } => results,
            Listing::Bare(items) => items,
        }
    }
}

impl Mem0Store {
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| {
            GatewayError::Config(format!("Invalid memory store URL '{}': {e}", config.url))
        })?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        tracing::info!("Mem0Store initialized with url: {}", base_url);

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Config(format!("Memory store URL cannot be a base: {}", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(response: std::result::Result<Response, reqwest::Error>) -> Result<Response> {
        let response = response
            .map_err(|e| GatewayError::StoreFailure(format!("Memory server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GatewayError::StoreFailure(format!(
                "Memory server returned {status}: {error_text}"
            )));
        }

        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json().await.map_err(|e| {
            GatewayError::StoreFailure(format!("Unexpected memory server response: {e}"))
        })
    }
}

#[async_trait]
impl MemoryStore for Mem0Store {
    async fn add(&self, memory: NewMemory) -> Result<AddOutcome> {
        let request = AddRequest {
            messages: vec![Message {
                role: "user",
                content: &memory.content,
            }],
            user_id: &memory.user_id,
            metadata: &memory.metadata,
            prompt: memory.prompt.as_deref(),
        };

        let url = self.endpoint(&["memories"])?;
        tracing::debug!("Adding memory via: {}", url);
        let response = Self::check(self.client.post(url).json(&request).send().await).await?;
        let events: Listing<MemoryEvent> = Self::parse(response).await?;

        Ok(AddOutcome {
            results: events.into_vec(),
        })
    }

    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryEntry>> {
        let url = self.endpoint(&["search"])?;
        let request = SearchRequest { query, user_id };
        let response = Self::check(self.client.post(url).json(&request).send().await).await?;
        let hits: Listing<MemoryEntry> = Self::parse(response).await?;
        Ok(hits.into_vec())
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        let url = self.endpoint(&["memories"])?;
        let response = Self::check(
            self.client
                .get(url)
                .query(&[("user_id", user_id)])
                .send()
                .await,
        )
        .await?;
        let memories: Listing<MemoryEntry> = Self::parse(response).await?;
        Ok(memories.into_vec())
    }

    async fn update(&self, memory_id: &str, text: &str) -> Result<()> {
        let url = self.endpoint(&["memories", memory_id])?;
        let request = UpdateRequest { text };
        Self::check(self.client.put(url).json(&request).send().await).await?;
        Ok(())
    }

    async fn delete(&self, memory_id: &str) -> Result<()> {
        let url = self.endpoint(&["memories", memory_id])?;
        Self::check(self.client.delete(url).send().await).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mem0"
    }
}
