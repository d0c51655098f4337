use axum::{extract::State, response::Json};
use chrono::Utc;
use tracing::{debug, instrument, warn};

use crate::schemas::{AppState, ErrorResponse, HealthResponse};

/// Health check endpoint
///
/// Always answers 200; `database` reports whether the store could be pinged.
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse),
        (status = 500, description = "Service is unhealthy", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    if !state.store.is_connected() {
        debug!("No database connection yet, health check will try to connect");
    }

    let (status, database) = match state.store.ping().await {
        Ok(()) => ("OK", "connected"),
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            ("DEGRADED", "disconnected")
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: database.to_string(),
        timestamp: Utc::now(),
    })
}
