use crate::api::AppState;
use crate::services::rate_limit_service::Tier;
use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

/// Records every governor decision; throttled responses carry `retry-after`.
pub async fn log_rate_limit_events(State(state): State<AppState>, request: Request<Body>, next: Next) -> Response {
    let tier = Tier::for_path(request.uri().path());
    let response = next.run(request).await;

    let retry_after = response.headers().get("retry-after").and_then(|v| v.to_str().ok());
    state.rate_limit_service.record(tier, response.status(), retry_after);

    response
}
