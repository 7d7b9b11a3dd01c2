//! Key classification subsystem.
//!
//! # Data Flow
//! ```text
//! etcd key (from listing or watch event)
//!     → classifier.rs (match against the three static patterns)
//!     → filter: server key / minor-server key / minor-backend key
//!     → ServerKey { backend_id, server_id } for the reconciler
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once, shared process-wide
//! - Keys that do not match are filtered, never reported as errors
//! - Parsing a non-server key is a checked error, not an index panic

pub mod classifier;

pub use classifier::{
    base_backend_id, is_minor_backend_key, is_minor_server_key, is_server_key,
    is_valid_minor_server_key, minor_backend_id, parse_backend_id, parse_server_id, KeyError,
    ServerKey, BACKENDS_PREFIX, ROOT,
};
