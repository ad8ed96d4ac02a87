use axum::{extract::State, http::StatusCode, response::IntoResponse};

use estate_types::api::{SellerListResponse, SellerRequest, SellerResponse};
use estate_types::models::SellerFields;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::validate::{optional, required};

fn seller_fields(req: SellerRequest) -> Result<SellerFields, ApiError> {
    Ok(SellerFields {
        name: required("name", req.name)?,
        property_type: required("property_type", req.property_type)?,
        location: optional(req.location),
        price: optional(req.price),
        contact: optional(req.contact),
    })
}

pub async fn list_sellers(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let sellers = state.db.call(|db| db.list_sellers()).await?;
    Ok(Json(SellerListResponse { sellers }))
}

pub async fn create_seller(
    State(state): State<AppState>,
    Json(req): Json<SellerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = seller_fields(req)?;
    let seller = state.db.call(move |db| db.create_seller(&fields)).await?;

    Ok((
        StatusCode::CREATED,
        Json(SellerResponse {
            success: true,
            seller,
        }),
    ))
}

pub async fn update_seller(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SellerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let fields = seller_fields(req)?;

    let seller = state
        .db
        .call(move |db| {
            if db.update_seller(id, &fields)? == 0 {
                return Ok(None);
            }
            db.get_seller(id)
        })
        .await?
        .ok_or_else(|| ApiError::NotFound("Seller not found".into()))?;

    Ok(Json(SellerResponse {
        success: true,
        seller,
    }))
}
