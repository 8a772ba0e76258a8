mod admin;
mod problem;
mod refresh;
mod router;
mod telemetry;
mod venues;

use std::net::SocketAddr;

use cantata_storage::Storage;
use cantata_util::{load_env_file, AppConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let storage = Storage::open(&config.venues_path, &config.cities_path);
    let admin = admin::AdminGate::new(config.admin_password.clone());
    if admin.is_open() {
        if config.environment.is_development() {
            info!(stage = "admin", "APP_ADMIN_PASSWORD not set; editing routes are open");
        } else {
            warn!(stage = "admin", "APP_ADMIN_PASSWORD not set; editing routes are open");
        }
    }

    let addr: SocketAddr = config.bind_addr;
    info!(
        stage = "app",
        %addr,
        env = %config.environment.as_str(),
        venues = %storage.venues_path().display(),
        cities = %storage.cities_path().display(),
        "starting HTTP server"
    );

    let state = router::AppState::new(
        metrics,
        refresh::RefreshHub::new(),
        storage,
        admin,
        config.sse_heartbeat_secs,
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
