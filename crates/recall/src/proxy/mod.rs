pub mod adapters;
mod augment;
mod engine;
pub mod provider;
mod server;
mod stream;

pub use adapters::{
    BackendAdapter, ByteStream, ResponseBody, ResponseMode, UpstreamRequest, UpstreamResponse,
    adapter_for,
};
pub use augment::{
    AugmentedRequest, ChatCompletionRequest, ChatMessage, MEMORY_PREAMBLE, MessageContent,
    augment_chat_request, format_memory_bullets, memory_context_prefix, parse_chat_request,
};
pub use engine::ProxyEngine;
pub use provider::{Auth, Credentials, ProviderDescriptor, ProviderKind};
pub use server::{AppState, ProxyServer, create_router};
pub use stream::{ChunkedStream, RELAY_CHUNK_SIZE};
