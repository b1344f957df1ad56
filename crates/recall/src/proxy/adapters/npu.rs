use async_trait::async_trait;
use axum::http::{Method, header};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{
    BackendAdapter, ResponseBody, ResponseMode, UpstreamRequest, UpstreamResponse, apply_auth,
    send, strip_client_routing, strip_framing,
};
use crate::error::{GatewayError, Result};
use crate::proxy::provider::ProviderDescriptor;

const MODEL_LIST_PATH: &str = "models";

/// On-device NPU backend (AnythingLLM's OpenAI-compatible API).
///
/// `POST` bodies are re-serialized as JSON. The model listing reports
/// workspace slugs in `id` and the real model name in `model`; clients
/// expect the latter, so the first entry's `id` is rewritten.
pub struct NpuAdapter {
    descriptor: ProviderDescriptor,
}

impl NpuAdapter {
    pub fn new(descriptor: ProviderDescriptor) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl BackendAdapter for NpuAdapter {
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
        let is_model_list =
            request.method == Method::GET && request.subpath.trim_matches('/') == MODEL_LIST_PATH;

        let mut headers = request.headers;
        strip_framing(&mut headers);
        strip_client_routing(&mut headers);
        apply_auth(&mut headers, &self.descriptor.auth)?;

        let builder = client.request(request.method.clone(), url).headers(headers);
        let builder = if request.method == Method::POST {
            let json: Value = serde_json::from_slice(&request.body).map_err(|e| {
                GatewayError::MalformedRequest(format!("Request body is not valid JSON: {e}"))
            })?;
            builder.json(&json)
        } else {
            builder.body(request.body)
        };

        let mut response = send(builder, mode).await?;
        response.headers.remove(header::CONNECTION);

        if is_model_list && response.status.is_success() {
            if let ResponseBody::Buffered(bytes) = &response.body {
                match rewrite_model_ids(bytes) {
                    Some(rewritten) => {
                        response.body = ResponseBody::Buffered(rewritten);
                        response.headers.remove(header::CONTENT_LENGTH);
                    }
                    None => {
                        tracing::warn!("Model listing from NPU backend has an unexpected shape, relaying unchanged");
                    }
                }
            }
        }

        Ok(response)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelList {
    data: Vec<ModelEntry>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ModelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

/// Copy the first model's `model` field into its `id`.
/// Returns `None` when the body is not a model listing with such an entry.
fn rewrite_model_ids(body: &[u8]) -> Option<Bytes> {
    let mut list: ModelList = serde_json::from_slice(body).ok()?;
    let first = list.data.first_mut()?;
    first.id = Some(first.model.clone()?);
    serde_json::to_vec(&list).ok().map(Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rewrite_model_ids_copies_model_into_id() {
        let body = json!({
            "object": "list",
            "data": [
                {"id": "my-workspace", "model": "llama3.2:3b", "object": "model"},
                {"id": "other", "model": "phi-3.5", "object": "model"}
            ]
        });

        let rewritten = rewrite_model_ids(&serde_json::to_vec(&body).unwrap()).unwrap();
        let parsed: Value = serde_json::from_slice(&rewritten).unwrap();

        assert_eq!(parsed["data"][0]["id"], "llama3.2:3b");
        assert_eq!(parsed["data"][0]["object"], "model");
        assert_eq!(parsed["data"][1]["id"], "other");
        assert_eq!(parsed["object"], "list");
    }

    #[test]
    fn test_rewrite_model_ids_empty_list() {
        let body = serde_json::to_vec(&json!({"data": []})).unwrap();
        assert!(rewrite_model_ids(&body).is_none());
    }

    #[test]
    fn test_rewrite_model_ids_missing_model_field() {
        let body = serde_json::to_vec(&json!({"data": [{"id": "slug"}]})).unwrap();
        assert!(rewrite_model_ids(&body).is_none());
    }

    #[test]
    fn test_rewrite_model_ids_not_json() {
        assert!(rewrite_model_ids(b"<html>bad gateway</html>").is_none());
    }
}
