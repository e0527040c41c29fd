//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{
    infrastructure::dto::http::{HistoryMessageDto, PresenceDto},
    ui::state::AppState,
};

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub limit: Option<usize>,
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current presence snapshot
pub async fn get_presence(State(state): State<Arc<AppState>>) -> Json<PresenceDto> {
    let snapshot = state.get_presence_usecase.execute().await;
    Json(snapshot.into())
}

/// Recent history, oldest first
pub async fn get_messages(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Vec<HistoryMessageDto>>, StatusCode> {
    match state.get_recent_messages_usecase.execute(query.limit).await {
        Ok(messages) => Ok(Json(messages.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to load history: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
