//! Offer handlers: submission, seller response, buyer withdrawal, and
//! the caller's offer list with lazy expiry.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{load_user, require_kyc_approved, AuthUser};
use crate::error::{ApiError, FieldError};
use crate::models::{
    offer_deposit_pence, CreateOfferRequest, Offer, OfferStatus, UpdateOfferRequest,
    MAX_OFFER_MESSAGE_LENGTH, OFFER_EXPIRY_DAYS,
};
use crate::AppState;

/// `POST /api/offers` — submit an offer on a live listing. The caller
/// must have approved identity verification; the deposit is computed
/// here, never taken from the client.
pub async fn create_offer(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<CreateOfferRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_kyc_approved(state.store.as_ref(), &user_id).await?;

    let mut errors = Vec::new();
    if request.amount <= 0.0 {
        errors.push(FieldError::new("amount", "Offer amount must be greater than zero"));
    }
    if request.message.chars().count() > MAX_OFFER_MESSAGE_LENGTH {
        errors.push(FieldError::new(
            "message",
            format!("Message must be at most {MAX_OFFER_MESSAGE_LENGTH} characters"),
        ));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let property = state
        .store
        .get_property(&request.property_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(ApiError::NotFound("Property"))?;
    if !property.is_paid {
        return Err(ApiError::Validation(vec![FieldError::new(
            "propertyId",
            "Property is not available for offers",
        )]));
    }
    if property.owner_id == user_id {
        return Err(ApiError::Validation(vec![FieldError::new(
            "propertyId",
            "You cannot make an offer on your own property",
        )]));
    }

    let now = Utc::now();
    let offer = Offer {
        id: Uuid::new_v4().to_string(),
        property_id: property.id.clone(),
        buyer_id: user_id.clone(),
        seller_id: property.owner_id.clone(),
        amount: request.amount,
        message: request.message,
        status: OfferStatus::Pending,
        deposit_paid: false,
        deposit_amount: offer_deposit_pence(request.amount),
        created_at: now,
        updated_at: now,
        expires_at: now + Duration::days(OFFER_EXPIRY_DAYS),
    };
    state.store.put_offer(offer.clone()).await?;
    info!(offer_id = %offer.id, property_id = %property.id, "offer submitted");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": offer })),
    ))
}

/// `PUT /api/offers/:id` — status transitions. The seller accepts
/// (KYC required) or rejects; the buyer withdraws. Only pending,
/// unexpired offers move; an overdue offer is marked expired on the
/// spot and the transition refused.
pub async fn update_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<UpdateOfferRequest>,
) -> Result<Json<Value>, ApiError> {
    load_user(state.store.as_ref(), &user_id).await?;
    let mut offer = state
        .store
        .get_offer(&id)
        .await?
        .ok_or(ApiError::NotFound("Offer"))?;
    if offer.buyer_id != user_id && offer.seller_id != user_id {
        return Err(ApiError::forbidden("You are not a party to this offer"));
    }

    let now = Utc::now();
    if offer.is_expired(now) {
        offer.status = OfferStatus::Expired;
        offer.updated_at = now;
        state.store.put_offer(offer).await?;
        return Err(ApiError::Validation(vec![FieldError::new(
            "status",
            "Offer has expired",
        )]));
    }
    if offer.status != OfferStatus::Pending {
        return Err(ApiError::Validation(vec![FieldError::new(
            "status",
            "Only pending offers can be updated",
        )]));
    }

    match request.status {
        OfferStatus::Accepted => {
            if offer.seller_id != user_id {
                return Err(ApiError::forbidden("Only the seller can accept an offer"));
            }
            require_kyc_approved(state.store.as_ref(), &user_id).await?;
        }
        OfferStatus::Rejected => {
            if offer.seller_id != user_id {
                return Err(ApiError::forbidden("Only the seller can reject an offer"));
            }
        }
        OfferStatus::Withdrawn => {
            if offer.buyer_id != user_id {
                return Err(ApiError::forbidden("Only the buyer can withdraw an offer"));
            }
        }
        OfferStatus::Pending | OfferStatus::Expired => {
            return Err(ApiError::Validation(vec![FieldError::new(
                "status",
                "Invalid status transition",
            )]));
        }
    }

    offer.status = request.status;
    offer.updated_at = now;
    state.store.put_offer(offer.clone()).await?;
    info!(offer_id = %offer.id, status = ?offer.status, "offer updated");
    Ok(Json(json!({ "success": true, "data": offer })))
}

/// `GET /api/offers` — offers where the caller is buyer or seller,
/// newest first. Overdue pending offers are expired as they are seen.
pub async fn list_offers(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    load_user(state.store.as_ref(), &user_id).await?;
    let now = Utc::now();
    let mut offers = state.store.list_offers_for_user(&user_id).await?;
    for offer in offers.iter_mut() {
        if offer.is_expired(now) {
            offer.status = OfferStatus::Expired;
            offer.updated_at = now;
            state.store.put_offer(offer.clone()).await?;
        }
    }
    offers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(Json(json!({ "success": true, "data": offers })))
}
