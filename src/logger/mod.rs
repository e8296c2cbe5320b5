//! Logger module
//!
//! Provides logging utilities for the HTTP server including:
//! - Subscriber setup (`RUST_LOG` wins over `logging.level`)
//! - Server lifecycle logging
//! - Access logging with multiple formats on the `access` target
//! - Connection error and warning logging

mod format;

pub use format::AccessLogEntry;

use crate::config::Config;
use std::net::SocketAddr;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Target used for access log lines, e.g. `RUST_LOG=access=off` silences them
pub const ACCESS_TARGET: &str = "access";

/// Install the global `tracing` subscriber.
///
/// Should be called once at application startup.
pub fn init(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    info!(
        addr = %addr,
        workers = ?config.server.workers,
        backlog = config.server.backlog,
        keep_alive = config.performance.keep_alive,
        connection_timeout_secs = config.performance.connection_timeout,
        max_connections = ?config.performance.max_connections,
        access_log = config.logging.access_log,
        access_log_format = %config.logging.access_log_format,
        "reqinfo listening on http://{addr}"
    );
}

pub fn log_server_stopped() {
    info!("reqinfo stopped");
}

pub fn log_signal_received(signal: &str) {
    info!(signal, "signal received");
}

pub fn log_shutdown_requested(in_flight: usize) {
    info!(in_flight, "shutdown signal received, draining connections");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    debug!(peer = %peer_addr, "connection accepted");
}

pub fn log_connection_error(peer_addr: &SocketAddr, err: &impl std::fmt::Display) {
    error!(peer = %peer_addr, "failed to serve connection: {err}");
}

pub fn log_connection_timeout(peer_addr: &SocketAddr, secs: u64) {
    warn!(peer = %peer_addr, "connection timed out after {secs} seconds");
}

pub fn log_connection_rejected(peer_addr: &SocketAddr, active: usize, max: u64) {
    warn!(peer = %peer_addr, "max connections reached: {active}/{max}, connection rejected");
}

pub fn log_accept_error(err: &std::io::Error) {
    error!("failed to accept connection: {err}");
}

pub fn log_error(message: &str) {
    error!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    info!(target: ACCESS_TARGET, "{}", entry.format(format));
}
