use axum::{
    extract::{Query, State},
    response::IntoResponse,
};

use estate_types::api::{ChatHistoryQuery, ChatHistoryResponse, ChatRequest, ChatResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::Json;

/// POST /chat
pub async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.message.trim().is_empty() {
        return Err(ApiError::Validation("Message required".into()));
    }

    let turn = state.chat.handle_turn(&req.message, req.session_id).await?;

    Ok(Json(ChatResponse {
        session_id: turn.session_id,
        reply: turn.reply,
        intent: turn.intent.as_str().to_string(),
        automation: turn.automation.map(str::to_string),
    }))
}

/// GET /chat/history?sessionId=...; without a session id every row is returned.
pub async fn history(
    State(state): State<AppState>,
    Query(query): Query<ChatHistoryQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let session_id = query.session_id.filter(|s| !s.trim().is_empty());
    let messages = state
        .db
        .call(move |db| db.chat_history(session_id.as_deref()))
        .await?;
    Ok(Json(ChatHistoryResponse { messages }))
}
