use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::routing::RouteSummary;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
    pub routes: usize,
    pub registration_enabled: bool,
    pub active_sessions: usize,
    pub throttled_clients: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshot = state.snapshot();
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
        routes: snapshot.table.len(),
        registration_enabled: snapshot.config.registration.enabled,
        active_sessions: state.services.sessions.len(),
        throttled_clients: state.services.limiter.tracked_keys(),
    })
}

pub async fn get_routes(State(state): State<AppState>) -> Json<Vec<RouteSummary>> {
    Json(state.snapshot().table.describe())
}
