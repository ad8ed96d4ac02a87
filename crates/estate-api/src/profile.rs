use axum::{
    Extension, Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use tracing::info;

use estate_db::is_unique_violation;
use estate_types::api::{Claims, ProfileResponse, ProfileUpdateResponse};
use estate_types::models::ProfileFields;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::uploads::{MAX_PROFILE_PICTURE_BYTES, is_image};
use crate::validate::{optional, required};

pub const PROFILE_PICTURE_FIELD: &str = "profilePicture";

/// GET /user/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, ApiError> {
    let id = claims.sub;
    let profile = state
        .db
        .call(move |db| db.get_user_profile(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    Ok(Json(ProfileResponse { profile }))
}

struct Picture {
    content_type: String,
    file_name: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Default)]
struct ProfileForm {
    username: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    company: Option<String>,
    picture: Option<Picture>,
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge("Profile picture must be 5MB or smaller".into())
    } else {
        ApiError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ProfileForm, ApiError> {
    let mut form = ProfileForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        if name == PROFILE_PICTURE_FIELD {
            let content_type = field.content_type().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;

            // Browsers send an empty part when no file was chosen
            if bytes.is_empty() {
                continue;
            }
            if bytes.len() > MAX_PROFILE_PICTURE_BYTES {
                return Err(ApiError::PayloadTooLarge(
                    "Profile picture must be 5MB or smaller".into(),
                ));
            }
            if !is_image(&content_type) {
                return Err(ApiError::Validation("Only image files are allowed".into()));
            }

            form.picture = Some(Picture {
                content_type,
                file_name,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let slot = match name.as_str() {
            "username" => &mut form.username,
            "email" => &mut form.email,
            "phone" => &mut form.phone,
            "bio" => &mut form.bio,
            "location" => &mut form.location,
            "company" => &mut form.company,
            _ => continue,
        };
        *slot = Some(field.text().await.map_err(multipart_error)?);
    }

    Ok(form)
}

/// PUT /user/profile: multipart text fields plus an optional image.
///
/// Every text field is replaced; the stored picture is only replaced when a
/// new image is uploaded.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_form(multipart?).await?;

    let username = required("username", form.username)?;
    let email = required("email", form.email)?;
    if !email.contains('@') {
        return Err(ApiError::Validation("email is invalid".into()));
    }

    let id = claims.sub;
    let existing = state
        .db
        .call(move |db| db.get_user_profile(id))
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let stored = match &form.picture {
        Some(p) => Some(
            state
                .uploads
                .save_profile_picture(&p.content_type, p.file_name.as_deref(), &p.bytes)
                .await
                .map_err(ApiError::Storage)?,
        ),
        None => None,
    };

    let fields = ProfileFields {
        username,
        email,
        phone: optional(form.phone),
        bio: optional(form.bio),
        location: optional(form.location),
        company: optional(form.company),
        profile_picture: stored.clone().or(existing.profile_picture.clone()),
    };

    let result = state
        .db
        .call(move |db| {
            if db.update_user_profile(id, &fields)? == 0 {
                return Ok(None);
            }
            db.get_user_profile(id)
        })
        .await;

    let updated = match result {
        Ok(Some(user)) => user,
        Ok(None) => {
            if let Some(name) = &stored {
                state.uploads.remove(name).await;
            }
            return Err(ApiError::NotFound("User not found".into()));
        }
        Err(e) => {
            if let Some(name) = &stored {
                state.uploads.remove(name).await;
            }
            if is_unique_violation(&e) {
                return Err(ApiError::Conflict("Username or email already exists".into()));
            }
            return Err(ApiError::Storage(e));
        }
    };

    // Replaced picture is no longer referenced
    if let (Some(_), Some(old)) = (&stored, &existing.profile_picture) {
        state.uploads.remove(old).await;
    }

    info!(user_id = id, "Profile updated");
    Ok(Json(ProfileUpdateResponse {
        message: "Profile updated successfully".into(),
        user: updated,
    }))
}
