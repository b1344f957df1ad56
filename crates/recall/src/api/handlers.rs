use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::de::DeserializeOwned;

use crate::api::{
    ActiveModelResponse, AddMemoryRequest, IngestResponse, ListMemoriesQuery,
    MemoryListResponse, StatusResponse, UpdateMemoryRequest,
};
use crate::error::{GatewayError, Result};
use crate::interests::{InterestSummarizer, InterestSummary};
use crate::memory::{AddOutcome, NewMemory, OcrCapture, PageCapture, SOURCE_MANUAL};
use crate::proxy::AppState;

const CONTENT_REQUIRED: &str = "Content is required";

/// Non-blank `content` or a 400
fn required_content(content: Option<String>) -> Result<String> {
    content
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| GatewayError::MalformedRequest(CONTENT_REQUIRED.to_string()))
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body)
        .map_err(|e| GatewayError::MalformedRequest(format!("Invalid JSON body: {e}")))
}

/// Store a capture and answer in the `{success, message|error}` shape
async fn ingest(state: &AppState, memory: Result<NewMemory>) -> Response {
    let result = match memory {
        Ok(memory) => state.store.add(memory).await.map(|_| ()),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => (
            StatusCode::OK,
            Json(IngestResponse::ok("Content added to memory")),
        )
            .into_response(),
        Err(e) => {
            e.log();
            (e.status(), Json(IngestResponse::failed(e.to_string()))).into_response()
        }
    }
}

pub async fn add_page(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let memory =
        parse_body::<PageCapture>(&body).and_then(|capture| capture.into_new_memory(&state.user_id));
    ingest(&state, memory).await
}

pub async fn add_ocr(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let memory =
        parse_body::<OcrCapture>(&body).and_then(|capture| capture.into_new_memory(&state.user_id));
    ingest(&state, memory).await
}

pub async fn get_interests(State(state): State<Arc<AppState>>) -> Result<Json<InterestSummary>> {
    let summary = InterestSummarizer::new(state.store.as_ref(), state.generator.as_ref())
        .summarize(&state.user_id)
        .await?;
    Ok(Json(summary))
}

pub async fn list_memories(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListMemoriesQuery>,
) -> Result<Json<MemoryListResponse>> {
    let user_id = query.user_id.as_deref().unwrap_or(&state.user_id);
    let results = state.store.get_all(user_id).await?;
    Ok(Json(MemoryListResponse { results }))
}

pub async fn add_memory(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<AddOutcome>)> {
    let request: AddMemoryRequest = parse_body(&body)?;
    let content = required_content(request.content)?;
    let user_id = request.user_id.unwrap_or_else(|| state.user_id.clone());

    let outcome = state
        .store
        .add(NewMemory::new(content, user_id, SOURCE_MANUAL))
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

pub async fn update_memory(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
    body: Bytes,
) -> Result<Json<StatusResponse>> {
    let request: UpdateMemoryRequest = parse_body(&body)?;
    let content = required_content(request.content)?;

    state.store.update(&memory_id, &content).await?;
    Ok(Json(StatusResponse {
        status: "updated".to_string(),
        id: Some(memory_id),
    }))
}

pub async fn delete_memory(
    State(state): State<Arc<AppState>>,
    Path(memory_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.store.delete(&memory_id).await?;
    Ok(Json(StatusResponse {
        status: "deleted".to_string(),
        id: None,
    }))
}

pub async fn active_model(State(state): State<Arc<AppState>>) -> Json<ActiveModelResponse> {
    let descriptor = state.engine.descriptor();
    Json(ActiveModelResponse {
        model: descriptor.model.clone(),
        provider: descriptor.kind.to_string(),
    })
}
