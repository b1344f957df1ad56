//! HTTP client for the gateway's management routes

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use recall_server::api::{
    ActiveModelResponse, AddMemoryRequest, MemoryListResponse, StatusResponse,
    UpdateMemoryRequest,
};
use recall_server::interests::InterestSummary;
use recall_server::memory::{AddOutcome, MemoryEntry};

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: Url,
}

impl GatewayClient {
    pub fn new(base_url: &str) -> CliResult<Self> {
        Ok(Self {
            client: Client::new(),
            base_url: Url::parse(base_url)?,
        })
    }

    fn url(&self, segments: &[&str]) -> CliResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CliError(format!("Gateway URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Decode a success body, or surface the gateway's `error` message
    async fn read<T: DeserializeOwned>(response: Response) -> CliResult<T> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
            .unwrap_or(body);
        Err(CliError(format!("Gateway returned {status}: {message}")))
    }

    pub async fn list_memories(&self, user_id: Option<&str>) -> CliResult<Vec<MemoryEntry>> {
        let mut request = self.client.get(self.url(&["memories"])?);
        if let Some(user_id) = user_id {
            request = request.query(&[("user_id", user_id)]);
        }
        let listing: MemoryListResponse = Self::read(request.send().await?).await?;
        Ok(listing.results)
    }

    pub async fn add_memory(&self, content: &str, user_id: Option<&str>) -> CliResult<AddOutcome> {
        let body = AddMemoryRequest {
            content: Some(content.to_string()),
            user_id: user_id.map(str::to_string),
        };
        let response = self
            .client
            .post(self.url(&["memories"])?)
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn update_memory(&self, id: &str, content: &str) -> CliResult<StatusResponse> {
        let body = UpdateMemoryRequest {
            content: Some(content.to_string()),
        };
        let response = self
            .client
            .put(self.url(&["memories", id])?)
            .json(&body)
            .send()
            .await?;
        Self::read(response).await
    }

    pub async fn delete_memory(&self, id: &str) -> CliResult<StatusResponse> {
        let response = self.client.delete(self.url(&["memories", id])?).send().await?;
        Self::read(response).await
    }

    pub async fn interests(&self) -> CliResult<InterestSummary> {
        let response = self.client.get(self.url(&["get_interests"])?).send().await?;
        Self::read(response).await
    }

    pub async fn active_model(&self) -> CliResult<ActiveModelResponse> {
        let response = self.client.get(self.url(&["active_model"])?).send().await?;
        Self::read(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

    #[test]
    fn test_url_joins_segments() {
        let client = GatewayClient::new("http://127.0.0.1:9000/").unwrap();
        assert_eq!(
            client.url(&["memories", "abc"]).unwrap().as_str(),
            "http://127.0.0.1:9000/memories/abc"
        );
    }

    #[tokio::test]
    async fn test_list_memories_passes_user() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("GET"))
            .and(matchers::path("/memories"))
            .and(matchers::query_param("user_id", "maria"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{"id": "1", "memory": "Speaks Portuguese"}]
            })))
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri()).unwrap();
        let memories = client.list_memories(Some("maria")).await.unwrap();
        assert_eq!(memories[0].memory, "Speaks Portuguese");
    }

    #[tokio::test]
    async fn test_error_body_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/memories"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "Content is required"})),
            )
            .mount(&server)
            .await;

        let client = GatewayClient::new(&server.uri()).unwrap();
        let err = client.add_memory("", None).await.unwrap_err();
        assert!(err.to_string().ends_with("Content is required"));
    }
}
