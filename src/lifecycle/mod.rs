//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validated config → metrics endpoint → clients → Synchronizer
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → exit
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then observability, then clients
//! - No graceful drain; a half-applied mirror is repaired by the next sweep

pub mod signals;
pub mod startup;

pub use signals::shutdown_signal;
pub use startup::{start, MinorSync, StartupError};
