pub mod auth;
pub mod handlers;

use axum::{middleware, routing::any, Router};

use self::auth::admin_auth_middleware;
use self::handlers::fault_inject;
use crate::http::server::AppState;

/// Operator routes, guarded by the optional bearer token.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/admin/fault-inject", any(fault_inject))
        .route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
