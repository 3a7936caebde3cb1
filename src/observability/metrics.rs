//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mux_sessions_active` (gauge): open sessions
//! - `mux_messages_total` (counter): messages by dispatch outcome
//! - `mux_dispatch_duration_seconds` (histogram): parse-to-close latency by outcome
//! - `mux_write_errors_total` (counter): failed frame writes
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; free when no exporter is installed
//! - Prometheus exporter runs its own HTTP listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one finished dispatch.
pub fn record_dispatch(outcome: &'static str, start: Instant) {
    counter!("mux_messages_total", "outcome" => outcome).increment(1);
    histogram!("mux_dispatch_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_write_error() {
    counter!("mux_write_errors_total").increment(1);
}

/// Keeps `mux_sessions_active` raised for the lifetime of a session.
#[derive(Debug)]
pub struct SessionGauge(());

impl SessionGauge {
    pub fn open() -> Self {
        gauge!("mux_sessions_active").increment(1.0);
        Self(())
    }
}

impl Drop for SessionGauge {
    fn drop(&mut self) {
        gauge!("mux_sessions_active").decrement(1.0);
    }
}
