//! Minor backend synchronizer for vulcand.
//!
//! Servers named `<name>-minor-<n>` under a vulcand backend are mirrored
//! into a `<backend>-minor` backend, first with a full sweep and then
//! incrementally from an etcd watch.

pub mod config;
pub mod etcd;
pub mod keys;
pub mod lifecycle;
pub mod observability;
pub mod sync;
pub mod vulcand;

pub use config::SyncConfig;
pub use sync::{SyncError, SyncPhase, Synchronizer};
