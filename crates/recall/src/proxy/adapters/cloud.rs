use async_trait::async_trait;
use axum::http::header;
use reqwest::Client;

use super::{
    BackendAdapter, ResponseMode, UpstreamRequest, UpstreamResponse, apply_auth, send,
    strip_client_routing, strip_framing,
};
use crate::error::Result;
use crate::proxy::provider::ProviderDescriptor;

/// Hosted OpenAI-compatible backend (Groq).
///
/// The client's `Host` would not match the remote host, so it is dropped
/// along with `Connection`. The gateway's API key replaces any
/// `Authorization` the client sent.
pub struct CloudAdapter {
    descriptor: ProviderDescriptor,
}

impl CloudAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl BackendAdapter for CloudAdapter {
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
        strip_client_routing(&mut headers);
        apply_auth(&mut headers, &self.descriptor.auth)?;

        let builder = client
            .request(request.method, url)
            .headers(headers)
            .body(request.body);

        let mut response = send(builder, mode).await?;
        response.headers.remove(header::CONNECTION);
        Ok(response)
    }
}
