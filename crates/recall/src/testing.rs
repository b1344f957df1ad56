//! Test utilities for recall - mocks for the store and generator seams
//!
//! Used by unit tests and by the integration tests under `tests/`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{GatewayError, Result};
use crate::interests::Generator;
use crate::memory::{AddOutcome, InMemoryStore, MemoryEntry, MemoryStore, NewMemory};

/// Generator that returns a fixed reply (or error) and records its prompts.
#[derive(Debug)]
pub struct ScriptedGenerator {
    reply: std::result::Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl ScriptedGenerator {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::with_reply(Ok(reply.into()))
    }

    /// Every call fails with an upstream error carrying `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(Err(message.into()))
    }

    fn with_reply(reply: std::result::Result<String, String>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt
            .lock()
            .map(|prompt| prompt.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_prompt.lock() {
            *last = Some(prompt.to_string());
        }
        self.reply
            .clone()
            .map_err(GatewayError::UpstreamFailure)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Store whose operations fail, optionally backed by a working store for
/// everything except search.
#[derive(Debug)]
pub struct FailingStore {
    inner: Option<InMemoryStore>,
}

impl FailingStore {
    /// Every operation fails
    pub fn unreachable() -> Self {
        Self { inner: None }
    }

    /// Only `search` fails; the rest is served by `inner`
    pub fn search_unavailable(inner: InMemoryStore) -> Self {
        Self { inner: Some(inner) }
    }

    fn inner(&self) -> Result<&InMemoryStore> {
        self.inner
            .as_ref()
            .ok_or_else(|| GatewayError::StoreFailure("Memory server unreachable".to_string()))
    }
}

#[async_trait]
impl MemoryStore for FailingStore {
    async fn add(&self, memory: NewMemory) -> Result<AddOutcome> {
        self.inner()?.add(memory).await
    }

    async fn search(&self, _query: &str, _user_id: &str) -> Result<Vec<MemoryEntry>> {
        Err(GatewayError::StoreFailure("Search index unavailable".to_string()))
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        self.inner()?.get_all(user_id).await
    }

    async fn update(&self, memory_id: &str, text: &str) -> Result<()> {
        self.inner()?.update(memory_id, text).await
    }

    async fn delete(&self, memory_id: &str) -> Result<()> {
        self.inner()?.delete(memory_id).await
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_generator_records_prompt() {
        let generator = ScriptedGenerator::replying("ok");
        assert_eq!(generator.generate("hello").await.unwrap(), "ok");
        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.last_prompt().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn unreachable_store_fails_everything() {
        let store = FailingStore::unreachable();
        assert!(store.get_all("u").await.is_err());
        assert!(store.search("q", "u").await.is_err());
        assert!(store.delete("id").await.is_err());
    }
}
