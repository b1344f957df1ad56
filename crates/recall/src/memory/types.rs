//! Memory types for the Recall gateway
//!
//! The gateway never owns memories; these types mirror what the external
//! store hands back and what it accepts on `add`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Source-specific metadata attached to a memory
pub type Metadata = Map<String, Value>;

/// A memory as returned by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Store-assigned identifier
    #[serde(default)]
    pub id: String,
    /// The memory text
    pub memory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    /// Relevance score, only present on search hits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Input to the store's `add` operation
#[derive(Debug, Clone, PartialEq)]
pub struct NewMemory {
    pub content: String,
    pub user_id: String,
    pub metadata: Metadata,
    /// Custom extraction instructions for the store's own LLM pass
    pub prompt: Option<String>,
}

impl NewMemory {
    pub fn new(content: impl Into<String>, user_id: impl Into<String>, source: &str) -> Self {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::String(source.to_string()));
        Self {
            content: content.into(),
            user_id: user_id.into(),
            metadata,
            prompt: None,
        }
    }

    /// Attach a metadata field; `None` values are stored as JSON null
    pub fn with_metadata(mut self, key: &str, value: Option<String>) -> Self {
        self.metadata
            .insert(key.to_string(), value.map(Value::String).unwrap_or(Value::Null));
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// One change the store made while handling `add`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub memory: String,
    /// e.g. ADD, UPDATE, DELETE, NONE
    #[serde(default)]
    pub event: String,
}

/// The store's answer to `add`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddOutcome {
    pub results: Vec<MemoryEvent>,
}
