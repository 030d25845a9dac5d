//! Payment authorization.
//!
//! # Data Flow
//! ```text
//! AuthorizeRequest
//!     → processor.rs (fault snapshot, breaker-guarded bank call, timing)
//!     → AuthMetrics (counters, histogram, labeled series)
//!     → AuthorizeResponse | AuthorizeError
//! ```

pub mod processor;
pub mod types;

pub use processor::{AuthorizationPipeline, AuthorizeError};
pub use types::{new_transaction_id, AuthorizeRequest, AuthorizeResponse};
