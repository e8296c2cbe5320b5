// Application state module
// Read-only configuration shared by every connection task plus the
// connection counter used for limits

use hyper::header::HeaderValue;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
    /// Pre-validated `Server` header, `None` if the configured name is not a valid header value
    pub server_header: Option<HeaderValue>,
    pub active_connections: AtomicUsize,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let server_header = HeaderValue::from_str(&config.http.server_name).ok();
        Self {
            config,
            server_header,
            active_connections: AtomicUsize::new(0),
        }
    }

    /// Reserve a connection slot. Increment first, then check, so two
    /// concurrent accepts cannot both slip under the limit.
    ///
    /// Returns the count before this connection on rejection.
    pub fn try_acquire_connection(&self) -> Result<(), usize> {
        let prev = self.active_connections.fetch_add(1, Ordering::SeqCst);
        if let Some(max) = self.config.performance.max_connections {
            if prev >= usize::try_from(max).unwrap_or(usize::MAX) {
                self.active_connections.fetch_sub(1, Ordering::SeqCst);
                return Err(prev);
            }
        }
        Ok(())
    }

    pub fn release_connection(&self) {
        self.active_connections.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_limit() {
        let mut cfg = Config::default();
        cfg.performance.max_connections = Some(2);
        let state = AppState::new(cfg);

        assert!(state.try_acquire_connection().is_ok());
        assert!(state.try_acquire_connection().is_ok());
        assert_eq!(state.try_acquire_connection(), Err(2));
        assert_eq!(state.active_connections(), 2);

        state.release_connection();
        assert!(state.try_acquire_connection().is_ok());
    }

    #[test]
    fn test_unlimited_by_default() {
        let state = AppState::new(Config::default());
        for _ in 0..1000 {
            assert!(state.try_acquire_connection().is_ok());
        }
        assert_eq!(state.active_connections(), 1000);
    }

    #[test]
    fn test_invalid_server_name_disables_header() {
        let mut cfg = Config::default();
        cfg.http.server_name = "bad\nname".to_string();
        assert!(AppState::new(cfg).server_header.is_none());
        assert!(AppState::new(Config::default()).server_header.is_some());
    }
}
