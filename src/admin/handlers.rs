use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::fault::FaultConfig;
use crate::http::request::read_json;
use crate::http::response::ApiError;
use crate::http::server::AppState;

/// Body of `POST /admin/fault-inject`. Missing fields read as zero values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FaultInjectRequest {
    pub enabled: bool,
    pub latency_ms: i64,
    pub success_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaultInjectResponse {
    pub fault_injection: FaultConfig,
}

/// `POST /admin/fault-inject` replaces the fault config; `GET` reads it.
pub async fn fault_inject(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Json<FaultInjectResponse>, ApiError> {
    let method = request.method().clone();
    if method == Method::POST {
        let limit = state.config.service.max_body_bytes;
        let body: FaultInjectRequest = read_json(request.into_body(), limit).await?;
        state
            .faults
            .set(body.enabled, body.latency_ms, body.success_rate);
    } else if method != Method::GET {
        return Err(ApiError::MethodNotAllowed);
    }

    Ok(Json(FaultInjectResponse {
        fault_injection: state.faults.get(),
    }))
}
