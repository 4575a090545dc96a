//! HTTP surface consumed by the dashboard frontend

pub mod handlers;

use anyhow::Result;
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::MetricConfig;
use crate::core::{ReceiptsProvider, SeriesProvider};

pub struct AppState {
    pub series: Arc<dyn SeriesProvider>,
    pub receipts: Arc<dyn ReceiptsProvider>,
    pub metrics: Vec<MetricConfig>,
}

pub fn router(state: Arc<AppState>) -> Router {
    // The dashboard is served from a different origin than this API.
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "macrodash API" }))
        .route("/api/fred/latest", get(handlers::fred_latest))
        .route("/api/treasury/mts/latest", get(handlers::treasury_latest))
        .route("/api/dashboard", get(handlers::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

pub async fn run(addr: SocketAddr, state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}
