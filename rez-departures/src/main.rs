use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rez_departures::boards::BoardConfig;
use rez_departures::dashboard::{Dashboard, POLL_INTERVAL, SnapshotStore};
use rez_departures::pid::{DemoTransport, PidClient, PidConfig, RetryPolicy, RetryingTransport, Transport};
use rez_departures::travel::EstimatorConfig;
use rez_departures::web::{AppState, create_router};

/// Address to listen on when `REZ_BIND` is not set.
const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind: SocketAddr = std::env::var("REZ_BIND")
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()?;

    let api_key = std::env::var("PID_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        warn!("PID_API_KEY not set, serving demo data");
        return serve(DemoTransport, bind).await;
    }

    let mut config = PidConfig::new(api_key);
    if let Ok(url) = std::env::var("PID_BASE_URL") {
        config = config.with_base_url(url);
    }
    let client = PidClient::new(config)?;
    info!(base_url = client.base_url(), "using live PID API");

    serve(RetryingTransport::new(client, RetryPolicy::default()), bind).await
}

async fn serve<T: Transport + 'static>(transport: T, bind: SocketAddr) -> Result<(), Box<dyn Error>> {
    let dashboard = Arc::new(Dashboard::new(
        transport,
        BoardConfig::default(),
        EstimatorConfig::default(),
    ));
    let snapshots = Arc::new(SnapshotStore::new());

    // Both run for the lifetime of the process.
    dashboard.spawn_sweepers();
    dashboard.spawn_poller(Arc::clone(&snapshots), POLL_INTERVAL);

    let app = create_router(AppState::new(dashboard, snapshots));

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!(%bind, "Řež departures listening");
    info!("  GET /health");
    info!("  GET /api/departures");
    info!("  GET /api/travel-time?line=S4&direction=to-masarykovo");
    info!("  GET /api/cache/stats");

    axum::serve(listener, app).await?;
    Ok(())
}
