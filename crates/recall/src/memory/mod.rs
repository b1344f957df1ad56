//! Memory store access
//!
//! The gateway never owns memories. It reaches the store through the
//! [`MemoryStore`] trait and turns captures into store inputs.

pub mod in_memory;
pub mod ingestion;
pub mod mem0;
pub mod store;
pub mod types;

pub use in_memory::InMemoryStore;
pub use ingestion::{OcrCapture, PageCapture, SOURCE_BROWSER, SOURCE_MANUAL, SOURCE_OCR};
pub use mem0::Mem0Store;
pub use store::MemoryStore;
pub use types::{AddOutcome, MemoryEntry, MemoryEvent, Metadata, NewMemory};
