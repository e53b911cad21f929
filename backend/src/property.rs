//! Property listing handlers: marketplace list/search plus owner CRUD.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::auth::{load_user, AuthUser};
use crate::error::{ApiError, FieldError};
use crate::models::{
    CreatePropertyRequest, ListingQuery, Pagination, Property, UpdatePropertyRequest, UserRole,
    DEFAULT_PAGE_SIZE, MAX_DESCRIPTION_LENGTH, MAX_PAGE_SIZE, MAX_TITLE_LENGTH,
    MIN_DESCRIPTION_LENGTH, MIN_TITLE_LENGTH,
};
use crate::search::{self, SearchCriteria};
use crate::AppState;

fn validate_title(title: &str, errors: &mut Vec<FieldError>) {
    let len = title.trim().chars().count();
    if !(MIN_TITLE_LENGTH..=MAX_TITLE_LENGTH).contains(&len) {
        errors.push(FieldError::new(
            "title",
            format!("Title must be between {MIN_TITLE_LENGTH} and {MAX_TITLE_LENGTH} characters"),
        ));
    }
}

fn validate_description(description: &str, errors: &mut Vec<FieldError>) {
    let len = description.trim().chars().count();
    if !(MIN_DESCRIPTION_LENGTH..=MAX_DESCRIPTION_LENGTH).contains(&len) {
        errors.push(FieldError::new(
            "description",
            format!(
                "Description must be between {MIN_DESCRIPTION_LENGTH} and {MAX_DESCRIPTION_LENGTH} characters"
            ),
        ));
    }
}

fn validate_create(request: &CreatePropertyRequest) -> Vec<FieldError> {
    let mut errors = Vec::new();
    validate_title(&request.title, &mut errors);
    validate_description(&request.description, &mut errors);
    if request.price <= 0.0 {
        errors.push(FieldError::new("price", "Price must be greater than zero"));
    }
    if request.bathrooms < 1 {
        errors.push(FieldError::new("bathrooms", "At least one bathroom is required"));
    }
    if request.size < 1.0 {
        errors.push(FieldError::new("size", "Size must be at least 1"));
    }
    if request.address.city.trim().is_empty() {
        errors.push(FieldError::new("address.city", "City is required"));
    }
    errors
}

/// `GET /api/properties` — paginated marketplace browse. Only active,
/// paid listings are visible; query filters combine with AND; newest
/// first. `total` counts all visible listings, not the filtered subset.
pub async fn list_properties(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<Value>, ApiError> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let mut errors = Vec::new();
    if page < 1 {
        errors.push(FieldError::new("page", "Page must be at least 1"));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        errors.push(FieldError::new(
            "limit",
            format!("Limit must be between 1 and {MAX_PAGE_SIZE}"),
        ));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let mut visible: Vec<Property> = state
        .store
        .list_properties()
        .await?
        .into_iter()
        .filter(|p| p.is_active && p.is_paid)
        .collect();
    let total = visible.len();

    if let Some(listing_type) = query.listing_type {
        visible.retain(|p| p.listing_type == listing_type);
    }
    if let Some(property_type) = query.property_type {
        visible.retain(|p| p.property_type == property_type);
    }
    if let Some(min_price) = query.min_price {
        visible.retain(|p| p.price >= min_price);
    }
    if let Some(max_price) = query.max_price {
        visible.retain(|p| p.price <= max_price);
    }
    if let Some(city) = &query.city {
        visible.retain(|p| p.address.city == *city);
    }
    visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    // Saturating: an absurd page number yields an empty page, never an
    // overflow.
    let properties: Vec<Property> = visible
        .into_iter()
        .skip(page.saturating_sub(1).saturating_mul(limit))
        .take(limit)
        .collect();
    let pagination = Pagination {
        page,
        limit,
        total,
        total_pages: total.div_ceil(limit),
    };
    Ok(Json(json!({
        "success": true,
        "data": { "properties": properties, "pagination": pagination },
    })))
}

/// Search result entry: the listing plus the distance badge value when
/// the search resolved to a point.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    #[serde(flatten)]
    property: Property,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_miles: Option<f64>,
}

/// `POST /api/properties/search` — the marketplace search form. The
/// location text is resolved here; filtering and ranking then run over
/// the visible listings.
pub async fn search_properties(
    State(state): State<AppState>,
    Json(mut criteria): Json<SearchCriteria>,
) -> Result<Json<Value>, ApiError> {
    // Resolution is server-side regardless of what the client sent.
    criteria.search_point = state.geocoder.geocode(&criteria.location).await;

    let visible: Vec<Property> = state
        .store
        .list_properties()
        .await?
        .into_iter()
        .filter(|p| p.is_active && p.is_paid)
        .collect();
    let mut results = search::filter_properties(visible, &criteria);
    search::rank_by_distance(&mut results, criteria.search_point);

    let total = results.len();
    let properties: Vec<SearchResult> = results
        .into_iter()
        .map(|property| {
            let distance_miles = criteria
                .search_point
                .and_then(|point| search::distance_from(&property, point))
                .map(|d| (d * 10.0).round() / 10.0);
            SearchResult {
                property,
                distance_miles,
            }
        })
        .collect();
    Ok(Json(json!({
        "success": true,
        "data": { "properties": properties, "total": total },
    })))
}

/// `GET /api/properties/:id` — 404 for missing or deactivated
/// listings. The view counter bumps after the fetch, so the returned
/// copy shows the pre-visit count.
pub async fn get_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let property = state
        .store
        .get_property(&id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(ApiError::NotFound("Property"))?;
    state.store.increment_views(&id).await?;
    Ok(Json(json!({ "success": true, "data": property })))
}

/// `POST /api/properties` — creates an inactive-for-buyers listing:
/// live for the owner but hidden from the marketplace until the
/// listing fee is paid.
pub async fn create_property(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<CreatePropertyRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    load_user(state.store.as_ref(), &user_id).await?;
    let errors = validate_create(&request);
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    let now = Utc::now();
    let property = Property {
        id: Uuid::new_v4().to_string(),
        title: request.title,
        description: request.description,
        property_type: request.property_type,
        listing_type: request.listing_type,
        price: request.price,
        bedrooms: request.bedrooms,
        bathrooms: request.bathrooms,
        size: request.size,
        size_unit: request.size_unit,
        address: request.address,
        images: request.images,
        floorplans: request.floorplans,
        features: request.features,
        owner_id: user_id.clone(),
        is_active: true,
        is_paid: false,
        views: 0,
        created_at: now,
        updated_at: now,
    };
    state.store.put_property(property.clone()).await?;
    info!(property_id = %property.id, owner_id = %user_id, "property listed");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "data": {
                "id": property.id,
                "message": "Property created. Complete payment to activate the listing.",
            },
        })),
    ))
}

async fn owned_property(
    state: &AppState,
    id: &str,
    user_id: &str,
    action: &str,
) -> Result<Property, ApiError> {
    let user = load_user(state.store.as_ref(), user_id).await?;
    let property = state
        .store
        .get_property(id)
        .await?
        .filter(|p| p.is_active)
        .ok_or(ApiError::NotFound("Property"))?;
    if property.owner_id != user_id && user.role != UserRole::Admin {
        return Err(ApiError::forbidden(format!(
            "You can only {action} your own properties"
        )));
    }
    Ok(property)
}

/// `PUT /api/properties/:id` — owner-or-admin partial merge. Provided
/// fields are validated; absent fields stay as they are.
pub async fn update_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<UpdatePropertyRequest>,
) -> Result<Json<Value>, ApiError> {
    let mut property = owned_property(&state, &id, &user_id, "update").await?;

    let mut errors = Vec::new();
    if let Some(title) = &request.title {
        validate_title(title, &mut errors);
    }
    if let Some(description) = &request.description {
        validate_description(description, &mut errors);
    }
    if matches!(request.price, Some(price) if price <= 0.0) {
        errors.push(FieldError::new("price", "Price must be greater than zero"));
    }
    if matches!(request.bathrooms, Some(0)) {
        errors.push(FieldError::new("bathrooms", "At least one bathroom is required"));
    }
    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }

    if let Some(title) = request.title {
        property.title = title;
    }
    if let Some(description) = request.description {
        property.description = description;
    }
    if let Some(property_type) = request.property_type {
        property.property_type = property_type;
    }
    if let Some(listing_type) = request.listing_type {
        property.listing_type = listing_type;
    }
    if let Some(price) = request.price {
        property.price = price;
    }
    if let Some(bedrooms) = request.bedrooms {
        property.bedrooms = bedrooms;
    }
    if let Some(bathrooms) = request.bathrooms {
        property.bathrooms = bathrooms;
    }
    if let Some(size) = request.size {
        property.size = size;
    }
    if let Some(size_unit) = request.size_unit {
        property.size_unit = size_unit;
    }
    if let Some(address) = request.address {
        property.address = address;
    }
    if let Some(images) = request.images {
        property.images = images;
    }
    if let Some(floorplans) = request.floorplans {
        property.floorplans = floorplans;
    }
    if let Some(features) = request.features {
        property.features = features;
    }
    property.updated_at = Utc::now();

    state.store.put_property(property.clone()).await?;
    Ok(Json(json!({ "success": true, "data": property })))
}

/// `DELETE /api/properties/:id` — soft delete; the record stays for
/// offer history but leaves the marketplace.
pub async fn delete_property(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> Result<Json<Value>, ApiError> {
    let mut property = owned_property(&state, &id, &user_id, "delete").await?;
    property.is_active = false;
    property.updated_at = Utc::now();
    state.store.put_property(property).await?;
    info!(property_id = %id, "property delisted");
    Ok(Json(json!({
        "success": true,
        "data": { "message": "Property deleted successfully" },
    })))
}
