//! Metrics collection and exposition.
//!
//! # Metrics
//! - `minor_sync_control_plane_writes_total` (counter): writes by `op`
//! - `minor_sync_watch_events_total` (counter): watch events by `relevant`
//! - `minor_sync_mirror_failures_total` (counter): failed incremental mirrors
//! - `minor_sync_phase` (gauge): 0=converging, 1=watching
//!
//! # Design Decisions
//! - Recording is always on; exposition is opt-in
//! - Without an installed recorder every call is a no-op

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::sync::SyncPhase;

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a mutation sent to the control plane.
pub fn record_write(op: &'static str) {
    metrics::counter!("minor_sync_control_plane_writes_total", "op" => op).increment(1);
}

/// Record a watch event, and whether it named a minor server.
pub fn record_watch_event(relevant: bool) {
    let relevant = if relevant { "true" } else { "false" };
    metrics::counter!("minor_sync_watch_events_total", "relevant" => relevant).increment(1);
}

/// Record an incremental mirror that failed and was skipped.
pub fn record_mirror_failure() {
    metrics::counter!("minor_sync_mirror_failures_total").increment(1);
}

/// Record the synchronizer's current phase.
pub fn record_phase(phase: SyncPhase) {
    let value = match phase {
        SyncPhase::Converging => 0.0,
        SyncPhase::Watching => 1.0,
    };
    metrics::gauge!("minor_sync_phase").set(value);
}
