use axum::{Json, extract::State, response::IntoResponse};

use estate_types::api::PropertyListResponse;

use crate::auth::AppState;
use crate::error::ApiError;

/// GET /properties: every listing with its seller's name and contact.
pub async fn list_properties(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let properties = state.db.call(|db| db.list_properties()).await?;
    Ok(Json(PropertyListResponse { properties }))
}
