//! Control plane subsystem (vulcand).
//!
//! # Data Flow
//! ```text
//! Synchronizer
//!     → gateway.rs (server_url / upsert_backend / upsert_server / delete_server)
//!     → control_plane.rs (ControlPlane trait)
//!     → client.rs (vulcand v2 HTTP API)   or   memory.rs (in-process, tests only)
//! ```
//!
//! # Design Decisions
//! - Every write is preceded by a read; unchanged state produces no write
//! - "Not found" is `Ok(None)`, never an error
//! - Writes carry no TTL and no version (last write wins)

pub mod client;
pub mod control_plane;
pub mod gateway;
#[doc(hidden)]
pub mod memory;
pub mod types;

pub use client::VulcandClient;
pub use control_plane::ControlPlane;
pub use gateway::Gateway;
#[doc(hidden)]
pub use memory::MemoryControlPlane;
pub use types::{Backend, GatewayError, GatewayResult, Server};
