use axum::{
    body::Body,
    extract::State,
    http::{Method, Request},
    Json,
};

use crate::http::request::read_json;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::payments::{AuthorizeRequest, AuthorizeResponse};

/// `POST /v1/authorize`
pub async fn authorize(
    State(state): State<AppState>,
    request: Request<Body>,
) -> Result<Json<AuthorizeResponse>, ApiError> {
    if request.method() != Method::POST {
        return Err(ApiError::MethodNotAllowed);
    }

    let limit = state.config.service.max_body_bytes;
    let payload: AuthorizeRequest = read_json(request.into_body(), limit).await?;

    let response = state.pipeline.authorize(payload).await?;
    Ok(Json(response))
}
