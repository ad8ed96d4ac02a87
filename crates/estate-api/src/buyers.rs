use axum::{extract::State, http::StatusCode, response::IntoResponse};

use estate_types::api::{BuyerListResponse, BuyerRequest, BuyerResponse};
use estate_types::models::BuyerFields;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::validate::{optional, required};

fn buyer_fields(req: BuyerRequest) -> Result<BuyerFields, ApiError> {
    Ok(BuyerFields {
        name: required("name", req.name)?,
        budget: required("budget", req.budget)?,
        location: optional(req.location),
        property_type: optional(req.property_type),
        contact: optional(req.contact),
    })
}

pub async fn list_buyers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let buyers = state.db.call(|db| db.list_buyers()).await?;
    Ok(Json(BuyerListResponse { buyers }))
}

pub async fn create_buyer(
    State(state): State<AppState>,
    Json(req): Json<BuyerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = buyer_fields(req)?;
    let buyer = state.db.call(move |db| db.create_buyer(&fields)).await?;

    Ok((
        StatusCode::CREATED,
        Json(BuyerResponse {
            success: true,
            buyer,
        }),
    ))
}

/// PUT /buyers/{id}: replaces every field of the buyer.
pub async fn update_buyer(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<BuyerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = buyer_fields(req)?;

    let buyer = state
        .db
        .call(move |db| {
            if db.update_buyer(id, &fields)? == 0 {
                return Ok(None);
            }
            db.get_buyer(id)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Buyer not found".into()))?;

    Ok(Json(BuyerResponse {
        success: true,
        buyer,
    }))
}
