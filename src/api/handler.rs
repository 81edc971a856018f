use std::sync::Arc;

use axum::Json;
use serde::Serialize;

use crate::config::Config;
use crate::runners::RunnerRepository;
use crate::sponsorships::{PendingRepository, SponsorshipRepository};

#[derive(Clone)]
pub struct AppState {
    pub runners: Arc<RunnerRepository>,
    pub sponsorships: Arc<SponsorshipRepository>,
    pub pending: Arc<PendingRepository>,
    pub config: Arc<Config>,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "milesponsor-backend",
    })
}
