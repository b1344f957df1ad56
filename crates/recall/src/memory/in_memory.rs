//! Process-local memory store
//!
//! Keeps memories in a concurrent map and ranks search hits by keyword
//! overlap. Nothing survives a restart; meant for development and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::error::{GatewayError, Result};
use crate::memory::store::MemoryStore;
use crate::memory::types::{AddOutcome, MemoryEntry, MemoryEvent, NewMemory};

/// Maximum number of search hits returned
const SEARCH_LIMIT: usize = 10;

/// Query words shorter than this are ignored when matching
const MIN_TERM_LEN: usize = 3;

#[derive(Debug, Clone)]
struct StoredMemory {
    seq: u64,
    entry: MemoryEntry,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    memories: DashMap<String, StoredMemory>,
    next_seq: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Memories of one user in insertion order
    fn owned_by(&self, user_id: &str) -> Vec<StoredMemory> {
        let mut owned: Vec<StoredMemory> = self
            .memories
            .iter()
            .filter(|m| m.entry.user_id.as_deref() == Some(user_id))
            .map(|m| m.value().clone())
            .collect();
        owned.sort_by_key(|m| m.seq);
        owned
    }
}

fn terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TERM_LEN)
        .map(str::to_lowercase)
        .collect()
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn add(&self, memory: NewMemory) -> Result<AddOutcome> {
        if memory.prompt.is_some() {
            tracing::debug!("InMemoryStore stores content verbatim, extraction prompt ignored");
        }

        let id = Uuid::new_v4().to_string();
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let entry = MemoryEntry {
            id: id.clone(),
            memory: memory.content.clone(),
            user_id: Some(memory.user_id),
            metadata: Some(memory.metadata),
            score: None,
            created_at: Some(Utc::now().to_rfc3339()),
        };
        self.memories.insert(id.clone(), StoredMemory { seq, entry });

        Ok(AddOutcome {
            results: vec![MemoryEvent {
                id,
                memory: memory.content,
                event: "ADD".to_string(),
            }],
        })
    }

    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryEntry>> {
        let query_terms = terms(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(f64, u64, MemoryEntry)> = self
            .owned_by(user_id)
            .into_iter()
            .filter_map(|stored| {
                let text = stored.entry.memory.to_lowercase();
                let matched = query_terms.iter().filter(|t| text.contains(t.as_str())).count();
                if matched == 0 {
                    return None;
                }
                let score = matched as f64 / query_terms.len() as f64;
                let mut entry = stored.entry;
                entry.score = Some(score);
                Some((score, stored.seq, entry))
            })
            .collect();

        hits.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        hits.truncate(SEARCH_LIMIT);

        Ok(hits.into_iter().map(|(_, _, entry)| entry).collect())
    }

    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryEntry>> {
        Ok(self
            .owned_by(user_id)
            .into_iter()
            .map(|stored| stored.entry)
            .collect())
    }

    async fn update(&self, memory_id: &str, text: &str) -> Result<()> {
        let mut stored = self
            .memories
            .get_mut(memory_id)
            .ok_or_else(|| GatewayError::StoreFailure(format!("Memory not found: {memory_id}")))?;
        stored.entry.memory = text.to_string();
        Ok(())
    }

    async fn delete(&self, memory_id: &str) -> Result<()> {
        self.memories
            .remove(memory_id)
            .map(|_| ())
            .ok_or_else(|| GatewayError::StoreFailure(format!("Memory not found: {memory_id}")))
    }

    fn name(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        for text in [
            "Enjoys hiking in the Alps",
            "Works on a Rust HTTP proxy",
            "Reads about Rust async runtimes and hiking gear",
        ] {
            store
                .add(NewMemory::new(text, "default_user", "manual"))
                .await
                .unwrap();
        }
        store
            .add(NewMemory::new("Rust fan", "someone_else", "manual"))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_get_all_is_scoped_and_ordered() {
        let store = seeded().await;
        let all = store.get_all("default_user").await.unwrap();

        let texts: Vec<&str> = all.iter().map(|m| m.memory.as_str()).collect();
        assert_eq!(
            texts,
            vec![
                "Enjoys hiking in the Alps",
                "Works on a Rust HTTP proxy",
                "Reads about Rust async runtimes and hiking gear",
            ]
        );
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_overlap() {
        let store = seeded().await;
        let hits = store.search("rust hiking", "default_user").await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].memory, "Reads about Rust async runtimes and hiking gear");
        assert_eq!(hits[0].score, Some(1.0));
        assert!(hits.iter().all(|h| h.user_id.as_deref() == Some("default_user")));
    }

    #[tokio::test]
    async fn test_search_without_matches_is_empty() {
        let store = seeded().await;
        assert!(store.search("gardening", "default_user").await.unwrap().is_empty());
        assert!(store.search("a an", "default_user").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let store = seeded().await;
        let id = store.get_all("default_user").await.unwrap()[0].id.clone();

        store.update(&id, "Enjoys climbing").await.unwrap();
        let all = store.get_all("default_user").await.unwrap();
        assert_eq!(all[0].memory, "Enjoys climbing");

        store.delete(&id).await.unwrap();
        assert_eq!(store.get_all("default_user").await.unwrap().len(), 2);
        assert!(matches!(
            store.delete(&id).await,
            Err(GatewayError::StoreFailure(_))
        ));
    }
}
