//! Metrics collection and exposition.
//!
//! # Metrics
//! - `netpanel_reloads_total` (counter): reloads handled by the supervisor
//! - `netpanel_server_starts_total` (counter): successful starts by kind
//! - `netpanel_server_stop_errors_total` (counter): failed or timed-out stops
//! - `netpanel_servers_running` (gauge): 1=running, 0=stopped, by kind

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::server::ServerKind;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_reload() {
    metrics::counter!("netpanel_reloads_total").increment(1);
}

pub fn record_server_start(kind: ServerKind) {
    metrics::counter!("netpanel_server_starts_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_stop_error(kind: ServerKind) {
    metrics::counter!("netpanel_server_stop_errors_total", "kind" => kind.as_str()).increment(1);
}

pub fn record_server_running(kind: ServerKind, running: bool) {
    metrics::gauge!("netpanel_servers_running", "kind" => kind.as_str())
        .set(if running { 1.0 } else { 0.0 });
}
