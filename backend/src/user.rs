//! User profile handlers: own profile CRUD and the public subset.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;

use crate::auth::{load_user, AuthUser};
use crate::error::{ApiError, FieldError};
use crate::models::UpdateProfileRequest;
use crate::AppState;

const MAX_NAME_LENGTH: usize = 100;

fn valid_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    (7..=20).contains(&trimmed.chars().count())
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || " +-()".contains(c))
}

/// `GET /api/users/profile` — the caller's full profile.
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = load_user(state.store.as_ref(), &user_id).await?;
    Ok(Json(json!({ "success": true, "data": user })))
}

/// `PUT /api/users/profile` — partial merge over the editable fields.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut user = load_user(state.store.as_ref(), &user_id).await?;

    let mut errors = Vec::new();
    if let Some(display_name) = &request.display_name {
        let len = display_name.trim().chars().count();
        if len == 0 || len > MAX_NAME_LENGTH {
            errors.push(FieldError::new(
                "displayName",
                format!("Display name must be between 1 and {MAX_NAME_LENGTH} characters"),
            ));
        }
    }
    if let Some(phone) = &request.phone_number {
        if !valid_phone(phone) {
            errors.push(FieldError::new("phoneNumber", "Invalid phone number format"));
        }
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(display_name) = request.display_name {
        user.display_name = display_name.trim().to_string();
    }
    if let Some(first_name) = request.first_name {
        user.first_name = Some(first_name);
    }
    if let Some(last_name) = request.last_name {
        user.last_name = Some(last_name);
    }
    if let Some(phone) = request.phone_number {
        user.phone_number = Some(phone.trim().to_string());
    }
    user.updated_at = Utc::now();

    state.store.put_user(user.clone()).await?;
    Ok(Json(json!({ "success": true, "data": user })))
}

/// `DELETE /api/users/profile` — soft delete; the account stops
/// authenticating but its records remain.
pub async fn delete_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let mut user = load_user(state.store.as_ref(), &user_id).await?;
    user.is_deleted = true;
    user.updated_at = Utc::now();
    state.store.put_user(user).await?;
    info!(user_id = %user_id, "account soft-deleted");
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Account deleted successfully" },
    })))
}

/// `GET /api/users/:id` — the subset of a profile shown to other
/// marketplace users. Email and contact details stay private.
pub async fn get_public_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let user = load_user(state.store.as_ref(), &id).await?;
    Ok(Json(json!({
        "success": true,
        "data": {
            "id": user.id,
            "displayName": user.display_name,
            "isVerified": user.is_verified,
            "createdAt": user.created_at,
        },
    })))
}
