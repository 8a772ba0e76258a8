use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{sse::Sse, IntoResponse},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::cors::CorsLayer;

use cantata_storage::Storage;

use crate::admin::AdminGate;
use crate::refresh::{keep_alive, RefreshHub, RefreshSource, RefreshStream};
use crate::{telemetry, venues};

#[derive(Clone)]
pub struct AppState {
    metrics: PrometheusHandle,
    refresh: RefreshHub,
    storage: Storage,
    admin: AdminGate,
    write_lock: Arc<Mutex<()>>,
    sse_heartbeat_secs: u64,
}

impl AppState {
    pub fn new(
        metrics: PrometheusHandle,
        refresh: RefreshHub,
        storage: Storage,
        admin: AdminGate,
        sse_heartbeat_secs: u64,
    ) -> Self {
        Self {
            metrics,
            refresh,
            storage,
            admin,
            write_lock: Arc::new(Mutex::new(())),
            sse_heartbeat_secs,
        }
    }

    pub fn metrics(&self) -> &PrometheusHandle {
        &self.metrics
    }

    pub fn refresh(&self) -> &RefreshHub {
        &self.refresh
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn admin(&self) -> &AdminGate {
        &self.admin
    }

    /// Serializes read-modify-write cycles on the data files within this process.
    pub async fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    pub fn sse_heartbeat(&self) -> u64 {
        self.sse_heartbeat_secs
    }
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .route("/events", get(events))
        .route("/trigger_refresh", post(trigger_refresh))
        .route("/api/venues", get(venues::list))
        .route("/api/route", get(venues::route))
        .route("/api/venues/register", post(venues::register))
        .route("/api/venues/update", post(venues::update))
        .route("/api/venues/delete", post(venues::delete))
        .route("/api/cities", get(venues::list_cities).post(venues::add_city))
        .route("/api/labels", get(venues::ui_labels))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    let body = telemetry::render_metrics(state.metrics());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

async fn events(State(state): State<AppState>) -> Sse<RefreshStream> {
    Sse::new(state.refresh().connect()).keep_alive(keep_alive(state.sse_heartbeat()))
}

async fn trigger_refresh(State(state): State<AppState>) -> (StatusCode, &'static str) {
    state.refresh().publish(RefreshSource::Trigger);
    (StatusCode::OK, "OK")
}

#[cfg(test)]
pub(crate) fn test_state(dir: &std::path::Path, admin_password: Option<&str>) -> AppState {
    let metrics = telemetry::init_metrics().expect("metrics init");
    let storage = Storage::open(dir.join("venues.json"), dir.join("cities.json"));
    AppState::new(
        metrics,
        RefreshHub::new(),
        storage,
        AdminGate::new(admin_password.map(str::to_string)),
        25,
    )
}
