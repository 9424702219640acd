//! Health probes

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: Status,
    pub version: &'static str,
    pub database: Status,
}

async fn database_status(pool: &PgPool) -> Status {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Status::Healthy,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            Status::Unhealthy
        }
    }
}

fn status_code(status: Status) -> StatusCode {
    match status {
        Status::Healthy => StatusCode::OK,
        Status::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Overall health, including database connectivity
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = database_status(&state.pool).await;

    (
        status_code(database),
        Json(HealthResponse {
            status: database,
            version: env!("CARGO_PKG_VERSION"),
            database,
        }),
    )
}

/// Liveness probe (200 while the process is serving)
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// Readiness probe (200 once the database is reachable)
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    status_code(database_status(&state.pool).await)
}
