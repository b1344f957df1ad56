//! Memory store contract
//!
//! The gateway consumes the memory backend only through this trait.
//! Implementations must be safe for concurrent use; the gateway adds no
//! locking of its own.

use async_trait::async_trait;

use crate::error::Result;
use crate::memory::types::{AddOutcome, MemoryEntry, NewMemory};

#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store new content for a user
    async fn add(&self, memory: NewMemory) -> Result<AddOutcome>;

    /// Memories relevant to `query`, most relevant first
    async fn search(&self, query: &str, user_id: &str) -> Result<Vec<MemoryEntry>>;

    /// Every memory the user owns
    async fn get_all(&self, user_id: &str) -> Result<Vec<MemoryEntry>>;

    /// Replace a memory's text
    async fn update(&self, memory_id: &str, text: &str) -> Result<()>;

    async fn delete(&self, memory_id: &str) -> Result<()>;

    /// Store name for logging
    fn name(&self) -> &'static str;
}
