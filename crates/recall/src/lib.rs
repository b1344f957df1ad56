//! Recall - memory-augmented LLM gateway
//!
//! Sits between a chat client and one OpenAI-compatible backend, injects
//! relevant long-term memories into chat requests and relays the streamed
//! completion back. Memories live in an external store reached through
//! [`memory::MemoryStore`].

pub mod api;
pub mod config;
pub mod error;
pub mod interests;
pub mod memory;
pub mod prompts;
pub mod proxy;
pub mod testing;

pub use error::GatewayError;
