use async_trait::async_trait;
use reqwest::Client;

use super::{BackendAdapter, ResponseMode, UpstreamRequest, UpstreamResponse, send, strip_framing};
use crate::error::Result;
use crate::proxy::provider::ProviderDescriptor;

/// Local default backend (Ollama's OpenAI-compatible API).
///
/// No authentication. Client headers, `Host` included, are forwarded as
/// they arrived.
pub struct LocalAdapter {
    descriptor: ProviderDescriptor,
}

impl LocalAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl BackendAdapter for LocalAdapter {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    async fn forward(
        &self,
        client: &Client,
        request: UpstreamRequest,
        mode: ResponseMode,
    ) -> Result<UpstreamResponse> {
        let url = self
            .descriptor
            .endpoint(&request.subpath, request.query.as_deref());

        let mut headers = request.headers;
        strip_framing(&mut headers);

        let builder = client
            .request(request.method, url)
            .headers(headers)
            .body(request.body);

        send(builder, mode).await
    }
}
