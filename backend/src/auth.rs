//! Bearer-token verification and the role/KYC guards built on top of it.
//!
//! Token issuance belongs to the identity provider; this service only
//! mints tokens in tests and verifies them everywhere else.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::models::{KycStatus, User, UserRole};
use crate::store::Store;
use crate::AppState;

const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User id
    pub exp: usize,  // Expiration time
}

/// Authenticated caller, inserted by [`authenticate`] for downstream
/// handlers to extract.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

pub fn create_token(user_id: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expiration,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(data.claims.sub)
}

/// Middleware for the protected route group: verifies the bearer token
/// and makes the caller id available as an [`AuthUser`] extension.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("Access token required"))?;
    let token = header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;
    let user_id = validate_token(token, &state.config.jwt_secret)
        .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;
    request.extensions_mut().insert(AuthUser(user_id));
    Ok(next.run(request).await)
}

/// Caller's profile, or an authorization failure when the account is
/// missing or soft-deleted.
pub async fn load_user(store: &dyn Store, user_id: &str) -> Result<User, ApiError> {
    let user = store
        .get_user(user_id)
        .await?
        .filter(|u| !u.is_deleted)
        .ok_or(ApiError::NotFound("User"))?;
    Ok(user)
}

pub async fn require_admin(store: &dyn Store, user_id: &str) -> Result<User, ApiError> {
    let user = load_user(store, user_id).await?;
    if user.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin access required"));
    }
    Ok(user)
}

/// Offer submission and acceptance are gated on approved identity
/// verification.
pub async fn require_kyc_approved(store: &dyn Store, user_id: &str) -> Result<User, ApiError> {
    let user = load_user(store, user_id).await?;
    if user.kyc_status != KycStatus::Approved {
        return Err(ApiError::forbidden(
            "You must complete identity verification to perform this action",
        ));
    }
    Ok(user)
}

/// `POST /api/auth/verify` — confirms the bearer token and returns the
/// stored account behind it. Runs inside the protected route group, so
/// reaching the handler already proves the token.
pub async fn verify(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let user = load_user(state.store.as_ref(), &user_id).await?;
    Ok(Json(json!({ "success": true, "data": user })))
}
