use axum::{Json, extract::State, response::IntoResponse};

use estate_types::api::ActivityResponse;

use crate::auth::AppState;
use crate::error::ApiError;

const RECENT_ACTIVITY_LIMIT: u32 = 10;

pub async fn recent_activity(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let activity = state
        .db
        .call(|db| db.recent_activity(RECENT_ACTIVITY_LIMIT))
        .await?;
    Ok(Json(ActivityResponse { activity }))
}
