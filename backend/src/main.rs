use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use backend::config::AppConfig;
use backend::geo::StaticGeocoder;
use backend::store::MemoryStore;
use backend::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;
    let state = AppState {
        config: config.clone(),
        store: Arc::new(MemoryStore::new()),
        geocoder: Arc::new(StaticGeocoder),
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(port = config.port, "property marketplace backend listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
