//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → optional TOML file (loader.rs)
//!     → environment variables and flags (overrides.rs)
//!     → validation.rs (semantic checks, all errors collected)
//!     → SyncConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults except the two endpoint URIs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod overrides;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use overrides::{merge, ConfigOverrides, ConfigReport, ETCD_URI_ENV, VULCAND_URI_ENV};
pub use schema::{EtcdConfig, ObservabilityConfig, SyncConfig, VulcandConfig};
pub use validation::{validate_config, ValidationError};
