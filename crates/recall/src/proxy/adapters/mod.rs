//! Backend adapters
//!
//! Each backend speaks the OpenAI wire format but differs in URL layout,
//! authentication and a few response quirks. An adapter turns a generic
//! [`UpstreamRequest`] into the backend-specific HTTP call and normalizes
//! what comes back.

mod cloud;
mod local;
mod npu;

pub use cloud::CloudAdapter;
pub use local::LocalAdapter;
pub use npu::NpuAdapter;

use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use reqwest::{Client, RequestBuilder};

use crate::error::{GatewayError, Result};
use crate::proxy::provider::{Auth, ProviderDescriptor, ProviderKind};
use crate::proxy::stream::{ChunkedStream, RELAY_CHUNK_SIZE};

/// Lazily pulled upstream body
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send>>;

/// Whether the upstream body is read fully or relayed as it arrives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    Buffered,
    Streaming,
}

/// A backend-agnostic request to forward
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub method: Method,
    /// Path below the backend's API prefix, e.g. `chat/completions`
    pub subpath: String,
    /// Raw query string, without the leading `?`
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub enum ResponseBody {
    Buffered(Bytes),
    Streaming(ByteStream),
}

impl std::fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseBody::Buffered(bytes) => write!(f, "Buffered({} bytes)", bytes.len()),
            ResponseBody::Streaming(_) => f.write_str("Streaming"),
        }
    }
}

/// Normalized upstream response, status and headers preserved
#[derive(Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ResponseBody,
}

impl IntoResponse for UpstreamResponse {
    fn into_response(self) -> Response {
        let body = match self.body {
            ResponseBody::Buffered(bytes) => Body::from(bytes),
            ResponseBody::Streaming(stream) => {
                Body::from_stream(ChunkedStream::new(stream, RELAY_CHUNK_SIZE))
            }
        };

        let mut response = Response::new(body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// Contract shared by all backends
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// The backend this adapter talks to
    fn descriptor(&self) -> &ProviderDescriptor;

    /// Perform the upstream call. Transport failures become
    /// [`GatewayError::UpstreamFailure`]; non-2xx statuses are returned as-is.
    async fn forward(
        &self,
        client: &Client,
        request: UpstreamRequest,
        mode: ResponseMode,
    ) -> Result<UpstreamResponse>;
}

/// Build the adapter for a resolved backend
pub fn adapter_for(descriptor: ProviderDescriptor) -> Arc<dyn BackendAdapter> {
    match descriptor.kind {
        ProviderKind::Npu => Arc::new(NpuAdapter::new(descriptor)),
        ProviderKind::Cloud => Arc::new(CloudAdapter::new(descriptor)),
        ProviderKind::Local => Arc::new(LocalAdapter::new(descriptor)),
    }
}

/// Drop request framing headers; the client recomputes them for the
/// (possibly rewritten) body.
pub(crate) fn strip_framing(headers: &mut HeaderMap) {
    headers.remove(header::CONTENT_LENGTH);
    headers.remove(header::TRANSFER_ENCODING);
}

/// Remove the client's `Host` and `Connection` so they never reach a remote backend
pub(crate) fn strip_client_routing(headers: &mut HeaderMap) {
    headers.remove(header::HOST);
    headers.remove(header::CONNECTION);
}

pub(crate) fn apply_auth(headers: &mut HeaderMap, auth: &Auth) -> Result<()> {
    if let Auth::Bearer(token) = auth {
        let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
            GatewayError::Config("API key contains characters not allowed in a header".into())
        })?;
        headers.insert(header::AUTHORIZATION, value);
    }
    Ok(())
}

/// Send the request and read the response in the requested mode
pub(crate) async fn send(builder: RequestBuilder, mode: ResponseMode) -> Result<UpstreamResponse> {
    let response = builder.send().await.map_err(|e| {
        if e.is_timeout() {
            GatewayError::UpstreamFailure(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            GatewayError::UpstreamFailure(format!("Failed to connect to upstream: {e}"))
        } else {
            GatewayError::UpstreamFailure(format!("Request failed: {e}"))
        }
    })?;

    let status = response.status();
    let headers = response.headers().clone();

    let body = match mode {
        ResponseMode::Buffered => {
            let bytes = response.bytes().await.map_err(|e| {
                GatewayError::UpstreamFailure(format!("Failed to read response body: {e}"))
            })?;
            ResponseBody::Buffered(bytes)
        }
        ResponseMode::Streaming => {
            let stream = response.bytes_stream().map(|chunk| chunk.map_err(std::io::Error::other));
            ResponseBody::Streaming(Box::pin(stream))
        }
    };

    Ok(UpstreamResponse {
        status,
        headers,
        body,
    })
}
