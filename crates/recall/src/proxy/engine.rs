//! Request proxy engine
//!
//! Generic passthrough to the active backend. The engine owns the HTTP
//! client and the adapter resolved at startup; it never falls back to a
//! different backend when the active one fails.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header;
use reqwest::Client;

use super::adapters::{BackendAdapter, ResponseMode, UpstreamRequest, UpstreamResponse, adapter_for};
use super::provider::ProviderDescriptor;
use crate::config::ServerConfig;
use crate::error::{GatewayError, Result};

#[derive(Clone)]
pub struct ProxyEngine {
    client: Client,
    adapter: Arc<dyn BackendAdapter>,
}

impl ProxyEngine {
    pub fn new(client: Client, adapter: Arc<dyn BackendAdapter>) -> Self {
        Self { client, adapter }
    }

    /// Build the engine for a resolved backend.
    ///
    /// Only the connect phase and the gap between reads are bounded, so a
    /// long streamed completion is never cut off by a total deadline.
    pub fn from_config(config: &ServerConfig, descriptor: ProviderDescriptor) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self::new(client, adapter_for(descriptor)))
    }

    pub fn descriptor(&self) -> &ProviderDescriptor {
        self.adapter.descriptor()
    }

    /// Forward a request to the active backend.
    ///
    /// The gateway frames the outgoing body itself, so any upstream
    /// `transfer-encoding` is dropped from the response.
    pub async fn proxy(
        &self,
        request: UpstreamRequest,
        mode: ResponseMode,
    ) -> Result<UpstreamResponse> {
        let provider = self.descriptor().kind;
        tracing::debug!(
            provider = %provider,
            method = %request.method,
            subpath = %request.subpath,
            ?mode,
            "Proxying request"
        );

        let mut response = self
            .adapter
            .forward(&self.client, request, mode)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    provider = %provider,
                    error_type = e.category(),
                    error_message = %e,
                    "Upstream call failed"
                );
            })?;

        response.headers.remove(header::TRANSFER_ENCODING);

        tracing::debug!(provider = %provider, status = %response.status, "Upstream responded");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use crate::proxy::adapters::ResponseBody;
    use crate::proxy::provider::Credentials;
    use async_trait::async_trait;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use axum::response::IntoResponse;
    use bytes::Bytes;
    use futures::{StreamExt, stream};

    /// Answers every request with a fixed chunked stream
    struct ChunkedAdapter {
        descriptor: ProviderDescriptor,
        chunks: Vec<&'static [u8]>,
    }

    #[async_trait]
    impl BackendAdapter for ChunkedAdapter {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        async fn forward(
            &self,
            _client: &Client,
            _request: UpstreamRequest,
            _mode: ResponseMode,
        ) -> Result<UpstreamResponse> {
            let mut headers = HeaderMap::new();
            headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));

            let chunks = self.chunks.clone();
            let body = stream::iter(
                chunks
                    .into_iter()
                    .map(|c| Ok::<_, std::io::Error>(Bytes::from_static(c))),
            );

            Ok(UpstreamResponse {
                status: StatusCode::OK,
                headers,
                body: ResponseBody::Streaming(Box::pin(body)),
            })
        }
    }

    fn engine(chunks: Vec<&'static [u8]>) -> ProxyEngine {
        let descriptor =
            ProviderDescriptor::resolve(&ProvidersConfig::default(), &Credentials::default());
        ProxyEngine::new(
            Client::new(),
            Arc::new(ChunkedAdapter { descriptor, chunks }),
        )
    }

    fn chat_request() -> UpstreamRequest {
        UpstreamRequest {
            method: Method::POST,
            subpath: "chat/completions".to_string(),
            query: None,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"{}"),
        }
    }

    #[tokio::test]
    async fn test_upstream_transfer_encoding_is_stripped() {
        let chunks: Vec<&'static [u8]> = vec![
            b"data: {\"delta\":\"Hel\"}\n\n",
            b"data: {\"delta\":\"lo\"}\n\n",
            b"data: [DONE]\n\n",
        ];

        let upstream = engine(chunks.clone())
            .proxy(chat_request(), ResponseMode::Streaming)
            .await
            .unwrap();
        assert!(upstream.headers.get(header::TRANSFER_ENCODING).is_none());

        let response = upstream.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::TRANSFER_ENCODING).is_none());
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/event-stream");

        let relayed: Vec<Bytes> = response
            .into_body()
            .into_data_stream()
            .map(|chunk| chunk.unwrap())
            .collect()
            .await;

        let expected: Vec<Bytes> = chunks.into_iter().map(Bytes::from_static).collect();
        assert_eq!(relayed, expected);
    }
}
