use axum::{extract::State, http::StatusCode};

use crate::dto::{HealthResponse, ReadyzChecks, ReadyzResponse};
use crate::extract::Json;
use crate::AppState;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<ReadyzResponse>) {
    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadyzResponse {
                status: "ready",
                checks: ReadyzChecks { store: "ok" },
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyzResponse {
                    status: "not_ready",
                    checks: ReadyzChecks { store: "failed" },
                }),
            )
        }
    }
}
