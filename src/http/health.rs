//! Health and metrics endpoints.

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use crate::http::response::ApiError;
use crate::http::server::AppState;

/// `GET /health`; 503 while the breaker is open.
pub async fn health(State(state): State<AppState>, method: Method) -> Response {
    if method != Method::GET {
        return ApiError::MethodNotAllowed.into_response();
    }

    let report = state.health.report();
    let code = if report.status.is_unhealthy() {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(report)).into_response()
}

/// `GET /metrics` in Prometheus text format.
pub async fn metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let handle = state.prometheus.as_ref().ok_or(ApiError::MetricsDisabled)?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
