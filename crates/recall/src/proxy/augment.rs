//! Memory augmentation for chat completion requests
//!
//! Searches the memory store with the last message's text and, when
//! anything matches, prepends the hits to that message. Only the last
//! message's `content` is rewritten in the raw JSON document; every other
//! field, explicit nulls included, is carried through untouched.

use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GatewayError, Result};
use crate::memory::{MemoryEntry, MemoryStore};

/// First line of the context block added to an augmented message
pub const MEMORY_PREAMBLE: &str = "Here are some memories about me that can help answer.";

/// An OpenAI-style chat completion request.
///
/// Only `messages` is interpreted; the rest is kept in `extra` and
/// serialized back verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<MessageContent>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Message content: plain text or a list of typed content parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<Value>),
}

impl MessageContent {
    /// Text used as the memory search query, if the content has any
    pub fn text(&self) -> Option<String> {
        let text = match self {
            MessageContent::Text(text) => text.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join("\n"),
        };

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    fn prefixed(self, prefix: &str) -> Self {
        match self {
            MessageContent::Text(text) => MessageContent::Text(format!("{prefix}{text}")),
            MessageContent::Parts(mut parts) => {
                parts.insert(0, serde_json::json!({ "type": "text", "text": prefix }));
                MessageContent::Parts(parts)
            }
        }
    }
}

/// The request body to forward, plus how many memories went into it
#[derive(Debug, Clone)]
pub struct AugmentedRequest {
    pub body: Bytes,
    pub memories_used: usize,
}

/// Parse and validate a chat completion body
pub fn parse_chat_request(body: &[u8]) -> Result<ChatCompletionRequest> {
    let request: ChatCompletionRequest = serde_json::from_slice(body).map_err(|e| {
        GatewayError::MalformedRequest(format!("Invalid chat completion request: {e}"))
    })?;

    if request.messages.is_empty() {
        return Err(GatewayError::MalformedRequest(
            "Chat completion request has no messages".to_string(),
        ));
    }

    Ok(request)
}

/// `- {memory}` per entry, joined by newlines, in the given order
pub fn format_memory_bullets(memories: &[MemoryEntry]) -> String {
    memories
        .iter()
        .map(|m| format!("- {}", m.memory))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text placed in front of the original message content
pub fn memory_context_prefix(memories: &[MemoryEntry]) -> String {
    format!(
        "{MEMORY_PREAMBLE}\n Memories: {}. \n ",
        format_memory_bullets(memories)
    )
}

/// Rewrite the last message of a chat request with relevant memories.
///
/// Returns the body unchanged when the last message has no text or the
/// search finds nothing.
pub async fn augment_chat_request(
    store: &dyn MemoryStore,
    user_id: &str,
    body: Bytes,
) -> Result<AugmentedRequest> {
    let started = Instant::now();
    let request = parse_chat_request(&body)?;
    let last_index = request.messages.len() - 1;

    let Some(query) = request.messages[last_index]
        .content
        .as_ref()
        .and_then(MessageContent::text)
    else {
        tracing::debug!("Last message has no text content, skipping memory search");
        return Ok(AugmentedRequest {
            body,
            memories_used: 0,
        });
    };

    let memories = store.search(&query, user_id).await?;

    if memories.is_empty() {
        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "No relevant memories found"
        );
        return Ok(AugmentedRequest {
            body,
            memories_used: 0,
        });
    }

    let prefix = memory_context_prefix(&memories);
    let content = request
        .messages
        .into_iter()
        .nth(last_index)
        .and_then(|message| message.content)
        .map(|content| content.prefixed(&prefix));

    let rewritten = replace_last_content(&body, last_index, content)?;

    tracing::debug!(
        memories = memories.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Memory augmentation finished"
    );

    Ok(AugmentedRequest {
        body: Bytes::from(rewritten),
        memories_used: memories.len(),
    })
}

/// Swap the `content` of `messages[index]` in the raw body, leaving the rest
/// of the document as the client sent it
fn replace_last_content(
    body: &[u8],
    index: usize,
    content: Option<MessageContent>,
) -> Result<Vec<u8>> {
    let serialize_error = |e: serde_json::Error| {
        GatewayError::MalformedRequest(format!("Failed to rewrite chat request: {e}"))
    };

    let mut document: Value = serde_json::from_slice(body).map_err(serialize_error)?;
    let message = document
        .get_mut("messages")
        .and_then(|messages| messages.get_mut(index))
        .and_then(Value::as_object_mut)
        .ok_or_else(|| {
            GatewayError::MalformedRequest("Chat message is not a JSON object".to_string())
        })?;
    message.insert(
        "content".to_string(),
        serde_json::to_value(content).map_err(serialize_error)?,
    );

    serde_json::to_vec(&document).map_err(serialize_error)
}
