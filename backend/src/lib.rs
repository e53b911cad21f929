//! Property marketplace backend: the HTTP API plus the search, wizard
//! and upload core it is built on.

pub mod auth;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod offer;
pub mod property;
pub mod search;
pub mod store;
pub mod upload;
pub mod user;
pub mod wizard;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post, put};
use axum::Router;

use crate::config::AppConfig;
use crate::geo::Geocoder;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub geocoder: Arc<dyn Geocoder>,
}

/// Assembles the API router. Marketplace browsing is public; anything
/// that writes, and anything personal, sits behind the bearer-token
/// middleware.
pub fn app(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/properties", get(property::list_properties))
        .route("/api/properties/search", post(property::search_properties))
        .route("/api/properties/:id", get(property::get_property))
        .route("/api/users/:id", get(user::get_public_profile));

    let protected = Router::new()
        .route("/api/properties", post(property::create_property))
        .route(
            "/api/properties/:id",
            put(property::update_property).delete(property::delete_property),
        )
        .route("/api/offers", post(offer::create_offer).get(offer::list_offers))
        .route("/api/offers/:id", put(offer::update_offer))
        .route(
            "/api/users/profile",
            get(user::get_profile)
                .put(user::update_profile)
                .delete(user::delete_profile),
        )
        .route("/api/auth/verify", post(auth::verify))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::authenticate,
        ));

    public.merge(protected).with_state(state)
}
