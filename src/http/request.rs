//! Request handling helpers.
//!
//! # Responsibilities
//! - Generate a UUID v4 `x-request-id` for every request that lacks one
//! - Read bodies under a size limit and decode them as JSON
//!
//! # Design Decisions
//! - An oversized body is rejected the same way as malformed JSON (400)
//! - Content-Type is not checked; the body is decoded regardless

use axum::{
    body::Body,
    http::{HeaderValue, Request},
};
use serde::de::DeserializeOwned;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::ApiError;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Buffer at most `limit` bytes of `body` and decode it as JSON.
pub async fn read_json<T>(body: Body, limit: usize) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    let bytes = axum::body::to_bytes(body, limit).await.map_err(|e| {
        tracing::debug!(error = %e, limit, "Failed to read request body");
        ApiError::InvalidBody
    })?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::debug!(error = %e, "Failed to decode request body");
        ApiError::InvalidBody
    })
}
