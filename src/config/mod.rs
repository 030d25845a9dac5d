//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (PORT / SERVICE_VERSION / LATENCY_BASE_MS / SUCCESS_RATE)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//!     → shared via Arc with the pipeline and health reporter
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only fault injection changes at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{finalize_config, load_or_default, ConfigError};
pub use schema::{
    AdminConfig, AuthServiceConfig, CircuitBreakerConfig, ListenerConfig, ObservabilityConfig,
    ServiceConfig,
};
