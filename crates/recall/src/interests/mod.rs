//! Interest summary
//!
//! Asks a language model to cluster all of a user's memories into named
//! topics, then looks up the memories behind each topic. Model output that
//! is not the expected JSON degrades to a plain-text summary instead of an
//! error.

pub mod generator;

pub use generator::{Generator, OllamaGenerator};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::memory::MemoryStore;
use crate::prompts::{INTEREST_PROMPT_FOOTER, INTEREST_PROMPT_HEADER};

pub const NO_MEMORIES_SUMMARY: &str = "No memories found for user.";
pub const NO_SUMMARY: &str = "No summary available.";
pub const UNNAMED_TOPIC: &str = "Unnamed";

/// A recurring theme and the memories that belong to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicCluster {
    pub name: String,
    pub count: u64,
    pub memories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestSummary {
    pub summary: String,
    pub topics: Vec<TopicCluster>,
}

/// What could be recovered from the model's answer
#[derive(Debug, Clone, PartialEq)]
pub struct ModelOutput {
    pub summary: String,
    pub topics: Vec<ModelTopic>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelTopic {
    pub name: Option<String>,
    pub count: u64,
}

pub struct InterestSummarizer<'a> {
    store: &'a dyn MemoryStore,
    generator: &'a dyn Generator,
}

impl<'a> InterestSummarizer<'a> {
    pub fn new(store: &'a dyn MemoryStore, generator: &'a dyn Generator) -> Self {
        Self { store, generator }
    }

    pub async fn summarize(&self, user_id: &str) -> Result<InterestSummary> {
        let memories: Vec<String> = self
            .store
            .get_all(user_id)
            .await?
            .into_iter()
            .map(|entry| entry.memory)
            .collect();

        if memories.is_empty() {
            return Ok(InterestSummary {
                summary: NO_MEMORIES_SUMMARY.to_string(),
                topics: Vec::new(),
            });
        }

        tracing::debug!(
            memories = memories.len(),
            generator = self.generator.name(),
            "Generating interest summary"
        );

        let output = self.generator.generate(&build_prompt(&memories)).await?;
        let parsed = parse_model_output(&output);

        let mut topics = Vec::with_capacity(parsed.topics.len());
        for topic in parsed.topics {
            let Some(name) = topic.name else {
                topics.push(TopicCluster {
                    name: UNNAMED_TOPIC.to_string(),
                    count: topic.count,
                    memories: Vec::new(),
                });
                continue;
            };

            let related = match self.store.search(&name, user_id).await {
                Ok(hits) => hits.into_iter().map(|hit| hit.memory).collect(),
                Err(e) => {
                    tracing::warn!(
                        topic = %name,
                        error_type = e.category(),
                        error_message = %e,
                        "Topic search failed, falling back to substring match"
                    );
                    substring_matches(&memories, &name)
                }
            };

            topics.push(TopicCluster {
                name,
                count: topic.count,
                memories: related,
            });
        }

        Ok(InterestSummary {
            summary: parsed.summary,
            topics,
        })
    }
}

/// Prompt header, one `- {memory}` line per memory, then the format footer
pub fn build_prompt(memories: &[String]) -> String {
    let mut prompt = String::from(INTEREST_PROMPT_HEADER);
    for memory in memories {
        prompt.push_str("- ");
        prompt.push_str(memory);
        prompt.push('\n');
    }
    prompt.push_str(INTEREST_PROMPT_FOOTER);
    prompt
}

/// Recover the summary and topic list from raw model output.
///
/// A surrounding Markdown code fence is ignored. Anything that is not a
/// JSON object becomes the summary as-is, with no topics.
pub fn parse_model_output(raw: &str) -> ModelOutput {
    let object = match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Object(object)) => object,
        Ok(_) => {
            tracing::warn!("Model output is JSON but not an object, using it as the summary");
            return raw_summary(raw);
        }
        Err(e) => {
            tracing::warn!("Failed to parse model output as JSON: {e}");
            return raw_summary(raw);
        }
    };

    let summary = object
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(NO_SUMMARY)
        .to_string();

    let topics = object
        .get("topics")
        .and_then(Value::as_array)
        .map(|topics| topics.iter().filter_map(parse_topic).collect())
        .unwrap_or_default();

    ModelOutput { summary, topics }
}

fn parse_topic(value: &Value) -> Option<ModelTopic> {
    let topic = value.as_object()?;

    let name = topic
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let count = topic
        .get("count")
        .and_then(|c| c.as_u64().or_else(|| c.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0);

    Some(ModelTopic { name, count })
}

fn raw_summary(raw: &str) -> ModelOutput {
    ModelOutput {
        summary: raw.trim().to_string(),
        topics: Vec::new(),
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop the language tag line, e.g. ```json
    match body.split_once('\n') {
        Some((_, inner)) => inner.trim(),
        None => body.trim(),
    }
}

fn substring_matches(memories: &[String], name: &str) -> Vec<String> {
    let needle = name.to_lowercase();
    memories
        .iter()
        .filter(|m| m.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}
