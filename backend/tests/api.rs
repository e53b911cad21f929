//! End-to-end tests driving the router directly, one request at a time.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use backend::auth::create_token;
use backend::config::AppConfig;
use backend::geo::StaticGeocoder;
use backend::models::{
    Address, KycStatus, ListingType, Offer, OfferStatus, Property, PropertyType, SizeUnit, User,
    UserRole,
};
use backend::store::{MemoryStore, Store};
use backend::{app, AppState};

const SECRET: &str = "test-secret";

fn test_state() -> (AppState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        config: AppConfig {
            port: 0,
            jwt_secret: SECRET.into(),
        },
        store: store.clone(),
        geocoder: Arc::new(StaticGeocoder),
    };
    (state, store)
}

fn user(id: &str, kyc_status: KycStatus) -> User {
    let now = Utc::now();
    User {
        id: id.into(),
        email: format!("{id}@example.com"),
        display_name: id.into(),
        first_name: None,
        last_name: None,
        phone_number: None,
        is_verified: true,
        kyc_status,
        role: UserRole::User,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

fn listing(id: &str, owner: &str, is_paid: bool) -> Property {
    let now = Utc::now();
    Property {
        id: id.into(),
        title: format!("Listing {id}"),
        description: "A well presented property in a popular area.".into(),
        property_type: PropertyType::House,
        listing_type: ListingType::Sale,
        price: 300_000.0,
        bedrooms: 3,
        bathrooms: 1,
        size: 1100.0,
        size_unit: SizeUnit::Sqft,
        address: Address {
            street: "1 High Street".into(),
            city: "London".into(),
            state: String::new(),
            zip_code: "SW1A 1AA".into(),
            country: "United Kingdom".into(),
            lat: Some(51.5014),
            lng: Some(-0.1419),
        },
        images: vec!["https://storage.example/images/front.jpg".into()],
        floorplans: vec![],
        features: vec![],
        owner_id: owner.into(),
        is_active: true,
        is_paid,
        views: 0,
        created_at: now,
        updated_at: now,
    }
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: AppState, req: Request<Body>) -> (StatusCode, Value) {
    let response = app(state).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn token_for(id: &str) -> String {
    create_token(id, SECRET).unwrap()
}

#[tokio::test]
async fn marketplace_hides_unpaid_listings() {
    let (state, store) = test_state();
    store.put_property(listing("paid", "seller", true)).await.unwrap();
    store.put_property(listing("unpaid", "seller", false)).await.unwrap();

    let (status, body) = send(state, request("GET", "/api/properties", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    let properties = body["data"]["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["id"], "paid");
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn absurd_page_number_returns_an_empty_page() {
    let (state, store) = test_state();
    store.put_property(listing("paid", "seller", true)).await.unwrap();

    let (status, body) = send(
        state,
        request(
            "GET",
            "/api/properties?page=400000000000000000&limit=50",
            None,
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["properties"].as_array().unwrap().is_empty());
    assert_eq!(body["data"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn city_filter_is_exact_equality() {
    let (state, store) = test_state();
    let mut leeds = listing("leeds", "seller", true);
    leeds.address.city = "Leeds".into();
    store.put_property(leeds).await.unwrap();
    store.put_property(listing("london", "seller", true)).await.unwrap();

    let (status, body) = send(
        state.clone(),
        request("GET", "/api/properties?city=Leeds", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let properties = body["data"]["properties"].as_array().unwrap();
    assert_eq!(properties.len(), 1);
    assert_eq!(properties[0]["id"], "leeds");

    // No case folding or substring matching.
    let (_, body) = send(
        state,
        request("GET", "/api/properties?city=leeds", None, None),
    )
    .await;
    assert!(body["data"]["properties"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn writes_require_a_token() {
    let (state, _) = test_state();
    let (status, body) = send(
        state,
        request("POST", "/api/properties", None, Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn create_property_starts_unpaid() {
    let (state, store) = test_state();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();

    let body = json!({
        "title": "Two-Bed Garden Flat",
        "description": "Bright flat with a private garden.",
        "type": "apartment",
        "listingType": "sale",
        "price": 275000.0,
        "bedrooms": 2,
        "bathrooms": 1,
        "size": 750.0,
        "address": { "street": "2 Low Lane", "city": "Leeds", "zipCode": "LS1 1AA" },
        "images": ["https://storage.example/images/a.jpg"],
    });
    let (status, response) = send(
        state,
        request("POST", "/api/properties", Some(&token_for("seller")), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = response["data"]["id"].as_str().unwrap();

    let created = store.get_property(id).await.unwrap().unwrap();
    assert!(created.is_active);
    assert!(!created.is_paid);
    assert_eq!(created.views, 0);
}

#[tokio::test]
async fn create_property_reports_field_errors() {
    let (state, store) = test_state();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();

    let body = json!({
        "title": "Tiny",
        "description": "Short.",
        "type": "house",
        "listingType": "sale",
        "price": 0.0,
        "bedrooms": 1,
        "bathrooms": 1,
        "size": 500.0,
        "address": { "street": "3 Side Street", "city": "Leeds", "zipCode": "LS2 2BB" },
    });
    let (status, response) = send(
        state,
        request("POST", "/api/properties", Some(&token_for("seller")), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields: Vec<&str> = response["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"title"));
    assert!(fields.contains(&"description"));
    assert!(fields.contains(&"price"));
}

#[tokio::test]
async fn only_the_owner_or_admin_updates_a_listing() {
    let (state, store) = test_state();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_user(user("stranger", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();

    let (status, _) = send(
        state.clone(),
        request(
            "PUT",
            "/api/properties/p1",
            Some(&token_for("stranger")),
            Some(json!({ "price": 1.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        state,
        request(
            "PUT",
            "/api/properties/p1",
            Some(&token_for("seller")),
            Some(json!({ "price": 310000.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = store.get_property("p1").await.unwrap().unwrap();
    assert_eq!(updated.price, 310_000.0);
}

#[tokio::test]
async fn deleted_listing_disappears_from_the_marketplace() {
    let (state, store) = test_state();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();

    let (status, _) = send(
        state.clone(),
        request("DELETE", "/api/properties/p1", Some(&token_for("seller")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(state.clone(), request("GET", "/api/properties/p1", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    // Record survives for offer history.
    assert!(store.get_property("p1").await.unwrap().is_some());
}

#[tokio::test]
async fn offers_require_approved_kyc() {
    let (state, store) = test_state();
    store.put_user(user("buyer", KycStatus::Pending)).await.unwrap();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();

    let (status, body) = send(
        state,
        request(
            "POST",
            "/api/offers",
            Some(&token_for("buyer")),
            Some(json!({ "propertyId": "p1", "amount": 290000.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn offer_lifecycle_submit_then_accept() {
    let (state, store) = test_state();
    store.put_user(user("buyer", KycStatus::Approved)).await.unwrap();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();

    let (status, response) = send(
        state.clone(),
        request(
            "POST",
            "/api/offers",
            Some(&token_for("buyer")),
            Some(json!({ "propertyId": "p1", "amount": 290000.0, "message": "Chain free." })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response["data"]["status"], "pending");
    // 1% of £290,000 in pence.
    assert_eq!(response["data"]["depositAmount"], 290_000);
    let offer_id = response["data"]["id"].as_str().unwrap().to_string();

    // The buyer cannot accept their own offer.
    let (status, _) = send(
        state.clone(),
        request(
            "PUT",
            &format!("/api/offers/{offer_id}"),
            Some(&token_for("buyer")),
            Some(json!({ "status": "accepted" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, response) = send(
        state,
        request(
            "PUT",
            &format!("/api/offers/{offer_id}"),
            Some(&token_for("seller")),
            Some(json!({ "status": "accepted" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["data"]["status"], "accepted");
}

fn expired_offer(id: &str) -> Offer {
    let placed = Utc::now() - Duration::days(8);
    Offer {
        id: id.into(),
        property_id: "p1".into(),
        buyer_id: "buyer".into(),
        seller_id: "seller".into(),
        amount: 290_000.0,
        message: String::new(),
        status: OfferStatus::Pending,
        deposit_paid: false,
        deposit_amount: 290_000,
        created_at: placed,
        updated_at: placed,
        expires_at: placed + Duration::days(7),
    }
}

#[tokio::test]
async fn overdue_offer_refuses_transitions_and_is_marked_expired() {
    let (state, store) = test_state();
    store.put_user(user("buyer", KycStatus::Approved)).await.unwrap();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();
    store.put_offer(expired_offer("o1")).await.unwrap();

    let (status, body) = send(
        state,
        request(
            "PUT",
            "/api/offers/o1",
            Some(&token_for("seller")),
            Some(json!({ "status": "accepted" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["message"], "Offer has expired");

    let stored = store.get_offer("o1").await.unwrap().unwrap();
    assert_eq!(stored.status, OfferStatus::Expired);
}

#[tokio::test]
async fn listing_offers_expires_overdue_ones_lazily() {
    let (state, store) = test_state();
    store.put_user(user("buyer", KycStatus::Approved)).await.unwrap();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();
    store.put_offer(expired_offer("o1")).await.unwrap();

    let (status, body) = send(
        state,
        request("GET", "/api/offers", Some(&token_for("buyer")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["status"], "expired");
    // The expiry sticks, it is not just a view-time relabel.
    let stored = store.get_offer("o1").await.unwrap().unwrap();
    assert_eq!(stored.status, OfferStatus::Expired);
}

#[tokio::test]
async fn offers_on_own_listing_are_refused() {
    let (state, store) = test_state();
    store.put_user(user("seller", KycStatus::Approved)).await.unwrap();
    store.put_property(listing("p1", "seller", true)).await.unwrap();

    let (status, _) = send(
        state,
        request(
            "POST",
            "/api/offers",
            Some(&token_for("seller")),
            Some(json!({ "propertyId": "p1", "amount": 290000.0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn search_resolves_location_and_ranks_by_distance() {
    let (state, store) = test_state();
    let mut westminster = listing("westminster", "seller", true);
    westminster.address.lat = Some(51.5014);
    westminster.address.lng = Some(-0.1419);
    let mut croydon = listing("croydon", "seller", true);
    croydon.address.city = "Croydon".into();
    croydon.address.lat = Some(51.3762);
    croydon.address.lng = Some(-0.0982);
    let mut manchester = listing("manchester", "seller", true);
    manchester.address.city = "Manchester".into();
    manchester.address.lat = Some(53.4808);
    manchester.address.lng = Some(-2.2426);
    store.put_property(westminster).await.unwrap();
    store.put_property(croydon).await.unwrap();
    store.put_property(manchester).await.unwrap();

    let (status, body) = send(
        state,
        request(
            "POST",
            "/api/properties/search",
            None,
            Some(json!({
                "listingType": "sale",
                "location": "London",
                "radius": "10-miles",
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let results = body["data"]["properties"].as_array().unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["westminster", "croydon"]);
    assert!(results[0]["distanceMiles"].as_f64().unwrap() < 2.0);
}

#[tokio::test]
async fn profile_round_trip_and_public_subset() {
    let (state, store) = test_state();
    store.put_user(user("alice", KycStatus::Approved)).await.unwrap();

    let (status, _) = send(
        state.clone(),
        request(
            "PUT",
            "/api/users/profile",
            Some(&token_for("alice")),
            Some(json!({ "displayName": "Alice A.", "phoneNumber": "+44 20 7946 0958" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        state.clone(),
        request("GET", "/api/users/profile", Some(&token_for("alice")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["displayName"], "Alice A.");

    let (status, body) = send(state, request("GET", "/api/users/alice", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["displayName"], "Alice A.");
    assert!(body["data"].get("email").is_none());
}

#[tokio::test]
async fn verify_returns_the_stored_account() {
    let (state, store) = test_state();
    store.put_user(user("alice", KycStatus::Approved)).await.unwrap();

    let (status, body) = send(
        state.clone(),
        request("POST", "/api/auth/verify", Some(&token_for("alice")), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], "alice");

    let (status, _) = send(
        state,
        request("POST", "/api/auth/verify", Some("not-a-token"), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
