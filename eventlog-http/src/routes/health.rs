//! `GET /v1/healthcheck` and `GET /v1/healthcheck/ready`.

use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
}

/// Fast liveness check: never touches the database, just confirms the
/// process is up and serving.
pub async fn healthcheck() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

/// Readiness probe: runs `SELECT 1` against the pool with a 3s timeout
///. A timeout or query failure is reported as 503, not a crash.
pub async fn healthcheck_ready(State(state): State<AppState>) -> (StatusCode, Json<HealthBody>) {
    let probe = tokio::time::timeout(
        Duration::from_secs(3),
        sqlx::query("SELECT 1").execute(&state.pool),
    )
    .await;

    match probe {
        Ok(Ok(_)) => (StatusCode::OK, Json(HealthBody { status: "ready" })),
        Ok(Err(err)) => {
            tracing::warn!(error = %err, "readiness probe query failed");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody { status: "not_ready" }))
        }
        Err(_) => {
            tracing::warn!("readiness probe timed out after 3s");
            (StatusCode::SERVICE_UNAVAILABLE, Json(HealthBody { status: "not_ready" }))
        }
    }
}
