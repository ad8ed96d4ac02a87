use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::uploads::MAX_PROFILE_PICTURE_BYTES;
use crate::{activity, buyers, chat, profile, properties, sellers};

/// Room for the multipart text fields around a full-size picture.
const PROFILE_BODY_LIMIT: usize = MAX_PROFILE_PICTURE_BYTES + 1024 * 1024;

/// Build the full application: JSON API under `/api`, pictures under `/uploads`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/buyers", get(buyers::list_buyers).post(buyers::create_buyer))
        .route("/buyers/{id}", put(buyers::update_buyer))
        .route("/sellers", get(sellers::list_sellers).post(sellers::create_seller))
        .route("/sellers/{id}", put(sellers::update_seller))
        .route("/properties", get(properties::list_properties))
        .route("/recent-activity", get(activity::recent_activity))
        .route("/chat", post(chat::send_message))
        .route("/chat/history", get(chat::history));

    let protected_routes = Router::new()
        .route(
            "/user/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(DefaultBodyLimit::max(PROFILE_BODY_LIMIT));

    let uploads = ServeDir::new(state.uploads.dir());

    let api = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .nest_service("/uploads", uploads)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "running" }))
}
