//! Synchronization subsystem.
//!
//! # Data Flow
//! ```text
//! ChangeSource::ls_recursive
//!     → keys (filter minor-backend keys) → Gateway: delete orphans
//!     → keys (filter valid minor-server keys) → mirror_one each
//! ChangeSource::watch_recursive (from the mirror sweep's index + 1)
//!     → one ChangeEvent at a time → keys filter → mirror_one
//! ```
//!
//! # Design Decisions
//! - Single logical thread: mirror_one never runs concurrently
//! - Sweeps fail fast; the watch loop logs mirror failures and continues
//! - No retries; a supervisor restarts the process on fatal errors

pub mod error;
pub mod synchronizer;

pub use error::{SyncError, SyncResult};
pub use synchronizer::{SyncPhase, Synchronizer};
