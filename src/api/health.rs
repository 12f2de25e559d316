use crate::api::MgmtState;
use crate::api::schemas::health::{ApiHealth, HealthResponse};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

/// Public health check on the API port.
pub async fn health() -> impl IntoResponse {
    Json(ApiHealth { status: "ok".to_string(), message: "Pharmacy API is running".to_string() })
}

/// Liveness check: returns 200 OK as long as the server is running.
pub async fn livez() -> impl IntoResponse {
    StatusCode::OK
}

/// Readiness check: checks that the document store answers.
pub async fn readyz(State(state): State<MgmtState>) -> impl IntoResponse {
    let (status_code, database) = match state.health_service.check_db().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, component = "database", "Readiness check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "error")
        }
    };

    let response = HealthResponse {
        status: if status_code == StatusCode::OK { "ok" } else { "error" }.to_string(),
        database: database.to_string(),
    };

    (status_code, Json(response))
}
