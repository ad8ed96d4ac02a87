use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::{info, warn};

use estate_chat::ChatResolver;
use estate_crypto::{hash_password, verify_password};
use estate_db::{Database, is_unique_violation};
use estate_types::api::{AuthResponse, Claims, LoginRequest, RegisterRequest};
use estate_types::models::{Role, UserProfile};

use crate::error::{ApiError, join_error};
use crate::extract::Json;
use crate::uploads::Uploads;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Arc<Database>,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub uploads: Uploads,
    pub chat: ChatResolver,
}

const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    // Validate input
    if username.len() < 3 || username.len() > 32 {
        return Err(ApiError::Validation(
            "username must be between 3 and 32 characters".into(),
        ));
    }
    if !email.contains('@') {
        return Err(ApiError::Validation("email is invalid".into()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    // Elevated roles are granted out of band, never by self-registration
    let role = req.role.unwrap_or_default();
    if !matches!(role, Role::User | Role::Agent) {
        return Err(ApiError::Validation("role must be user or agent".into()));
    }

    // Check if username or email is taken
    let (u, e) = (username.clone(), email.clone());
    let (by_name, by_email) = state
        .db
        .call(move |db| Ok((db.get_user_by_username(&u)?, db.get_user_by_email(&e)?)))
        .await?;
    if by_name.is_some() {
        return Err(ApiError::Conflict("Username already exists".into()));
    }
    if by_email.is_some() {
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(join_error)?
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let user = state
        .db
        .call(move |db| db.create_user(&username, &email, &password_hash, role))
        .await
        .map_err(|e| {
            // Lost a race with a concurrent registration
            if is_unique_violation(&e) {
                ApiError::Conflict("Username or email already exists".into())
            } else {
                ApiError::Storage(e)
            }
        })?;

    let token = create_token(&state.jwt_secret, &user, state.token_ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!(user_id = user.id, "Registered user {}", user.username);
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let username = req.username.trim().to_string();
    let user = state
        .db
        .call(move |db| db.get_user_by_username(&username))
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Verify password
    let password = req.password;
    let digest = user.password_hash;
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &digest))
        .await
        .map_err(join_error)?;

    match verified {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::InvalidCredentials),
        Err(e) => {
            warn!(user_id = user.profile.id, "Stored password digest unusable: {}", e);
            return Err(ApiError::InvalidCredentials);
        }
    }

    let token = create_token(&state.jwt_secret, &user.profile, state.token_ttl)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: user.profile,
    }))
}

pub fn create_token(
    secret: &str,
    user: &UserProfile,
    ttl: chrono::Duration,
) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        role: user.role,
        exp: (chrono::Utc::now() + ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}
