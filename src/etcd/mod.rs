//! Change source subsystem (etcd).
//!
//! # Data Flow
//! ```text
//! Sweep:
//!     source.rs (ChangeSource::ls_recursive)
//!     → client.rs (GET /v2/keys/<prefix>?recursive=true)
//!     → Listing { flattened keys, X-Etcd-Index }
//!
//! Watch:
//!     source.rs (ChangeSource::watch_recursive, from listing index + 1)
//!     → client.rs (long-poll GET ...?wait=true&waitIndex=N, repeated)
//!     → WatchStream of ChangeEvent, one per mutation
//! ```
//!
//! # Design Decisions
//! - Read-only: nothing is ever written to etcd
//! - The watch is a lazy stream; one event is polled at a time
//! - The stream ends only with an error; no reconnect policy lives here
//! - A cleared event history ends the stream; lost events need a new sweep

pub mod client;
pub mod source;
pub mod types;

pub use client::EtcdClient;
pub use source::{ChangeSource, WatchStream};
pub use types::{ChangeEvent, Listing, StoreError, StoreResult};
