pub mod config;
pub mod core;
pub mod providers;
pub mod server;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info};

use crate::providers::{FredProvider, TreasuryMtsProvider};
use crate::server::AppState;

pub async fn run_server(config_path: Option<&str>, port: Option<u16>) -> Result<()> {
    info!("macrodash starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let fred_base_url = config
        .providers
        .fred
        .as_ref()
        .map_or("https://fred.stlouisfed.org", |p| &p.base_url);
    let series = Arc::new(FredProvider::new(fred_base_url));

    let treasury_base_url = config
        .providers
        .treasury
        .as_ref()
        .map_or("https://api.fiscaldata.treasury.gov", |p| &p.base_url);
    let receipts = Arc::new(TreasuryMtsProvider::new(treasury_base_url));

    let state = Arc::new(AppState {
        series,
        receipts,
        metrics: config.metrics.clone(),
    });

    let addr: SocketAddr = format!(
        "{}:{}",
        config.server.host,
        port.unwrap_or(config.server.port)
    )
    .parse()
    .with_context(|| format!("Invalid listen address: {}", config.server.host))?;

    server::run(addr, state).await
}
