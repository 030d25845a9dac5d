//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID + trace layers)
//!     → request.rs (request ID, bounded JSON body)
//!     → authorize.rs / health.rs / admin router
//!     → response.rs (JSON error bodies)
//!     → Send to client
//! ```

pub mod authorize;
pub mod health;
pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{ApiError, ErrorBody};
pub use server::{build_router, AppState, HttpServer, ServiceParts};
