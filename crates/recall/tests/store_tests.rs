//! Integration tests for the mem0 REST store client

use serde_json::json;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use recall_server::GatewayError;
use recall_server::config::StoreConfig;
use recall_server::memory::{Mem0Store, MemoryStore, NewMemory, OcrCapture};
use recall_server::prompts::OCR_EXTRACTION_PROMPT;

fn store(url: &str) -> Mem0Store {
    Mem0Store::new(&StoreConfig {
        url: url.to_string(),
        ..StoreConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_add_posts_user_message_with_metadata() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/memories"))
        .and(matchers::body_json(json!({
            "messages": [{"role": "user", "content": "Prefers tea"}],
            "user_id": "default_user",
            "metadata": {"source": "manual"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"id": "m-1", "memory": "Prefers tea", "event": "ADD"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store(&server.uri())
        .add(NewMemory::new("Prefers tea", "default_user", "manual"))
        .await
        .unwrap();

    assert_eq!(outcome.results.len(), 1);
    assert_eq!(outcome.results[0].id, "m-1");
    assert_eq!(outcome.results[0].event, "ADD");
}

#[tokio::test]
async fn test_ocr_add_sends_extraction_prompt() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/memories"))
        .and(matchers::body_partial_json(json!({
            "prompt": OCR_EXTRACTION_PROMPT,
            "metadata": {"source": "ocr_screenshot", "app_name": "Mail", "window_name": null}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let capture: OcrCapture =
        serde_json::from_value(json!({"text": "Invoice #42 due Friday", "app_name": "Mail"})).unwrap();

    store(&server.uri())
        .add(capture.into_new_memory("default_user").unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_search_scopes_to_user() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/search"))
        .and(matchers::body_json(json!({"query": "travel plans", "user_id": "default_user"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {"id": "a", "memory": "Flying to Lisbon in May", "score": 0.91},
                {"id": "b", "memory": "Needs a new passport", "score": 0.55}
            ]
        })))
        .mount(&server)
        .await;

    let hits = store(&server.uri())
        .search("travel plans", "default_user")
        .await
        .unwrap();

    let texts: Vec<&str> = hits.iter().map(|h| h.memory.as_str()).collect();
    assert_eq!(texts, vec!["Flying to Lisbon in May", "Needs a new passport"]);
    assert_eq!(hits[0].score, Some(0.91));
}

#[tokio::test]
async fn test_get_all_accepts_bare_array() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("GET"))
        .and(matchers::path("/memories"))
        .and(matchers::query_param("user_id", "default_user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "a", "memory": "Owns a cat", "user_id": "default_user"}
        ])))
        .mount(&server)
        .await;

    let memories = store(&server.uri()).get_all("default_user").await.unwrap();

    assert_eq!(memories.len(), 1);
    assert_eq!(memories[0].memory, "Owns a cat");
}

#[tokio::test]
async fn test_update_and_delete_use_memory_path() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("PUT"))
        .and(matchers::path("/memories/abc-123"))
        .and(matchers::body_json(json!({"text": "Owns two cats"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(matchers::method("DELETE"))
        .and(matchers::path("/memories/abc-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
        .expect(1)
        .mount(&server)
        .await;

    let store = store(&server.uri());
    store.update("abc-123", "Owns two cats").await.unwrap();
    store.delete("abc-123").await.unwrap();
}

#[tokio::test]
async fn test_server_error_is_store_failure() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(500).set_body_string("vector store offline"))
        .mount(&server)
        .await;

    let err = store(&server.uri())
        .search("anything", "default_user")
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::StoreFailure(_)));
    assert!(err.to_string().contains("vector store offline"));
}

#[tokio::test]
async fn test_unexpected_body_is_store_failure() {
    let server = MockServer::start().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    assert!(matches!(
        store(&server.uri()).get_all("default_user").await,
        Err(GatewayError::StoreFailure(_))
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_store_failure() {
    assert!(matches!(
        store("http://127.0.0.1:1").get_all("default_user").await,
        Err(GatewayError::StoreFailure(_))
    ));
}
