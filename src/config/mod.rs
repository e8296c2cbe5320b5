// Configuration module entry point
// Loads layered configuration (defaults, file, environment, command line)

mod state;
mod types;

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::Path;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::cli::CliArgs;
use crate::error::{Error, Result};

pub use state::AppState;
pub use types::Config;

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "reqinfo";

/// Prefix for environment overrides, e.g. `REQINFO_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "REQINFO";

impl Config {
    /// Load configuration from an explicit file, or from `reqinfo.{toml,yaml,json}`
    /// in the working directory when present, layered under `REQINFO_*` variables.
    ///
    /// Not validated here; call [`Config::validate`] after CLI overrides.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self> {
        let defaults = Self::default();
        let builder = config::Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.backlog", i64::from(defaults.server.backlog))?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.access_log", defaults.logging.access_log)?
            .set_default("logging.access_log_format", defaults.logging.access_log_format)?
            .set_default("performance.keep_alive", defaults.performance.keep_alive)?
            .set_default(
                "performance.connection_timeout",
                defaults.performance.connection_timeout,
            )?
            .set_default("http.server_name", defaults.http.server_name)?;

        let builder = match config_path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Apply command-line overrides on top of the loaded values
    pub fn apply_cli(&mut self, args: &CliArgs) {
        if let Some(ref host) = args.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = args.port {
            self.server.port = port;
        }
        if let Some(workers) = args.workers {
            self.server.workers = Some(workers);
        }
        if let Some(ref level) = args.log_level {
            self.logging.level.clone_from(level);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.backlog <= 0 {
            return Err(Error::InvalidConfig(format!(
                "server.backlog must be positive, got {}",
                self.server.backlog
            )));
        }
        if self.server.workers == Some(0) {
            return Err(Error::InvalidConfig(
                "server.workers must be at least 1".to_string(),
            ));
        }
        self.validate_log_level()?;
        self.get_socket_addr().map(|_| ())
    }

    /// A bare word must be a level; `EnvFilter` would otherwise take it as a target name.
    fn validate_log_level(&self) -> Result<()> {
        let level = self.logging.level.trim();
        let invalid = |reason: String| {
            Error::InvalidConfig(format!("logging.level {level:?} is not valid: {reason}"))
        };

        if !level.contains(['=', ',', '[']) {
            return level
                .parse::<LevelFilter>()
                .map(|_| ())
                .map_err(|e| invalid(e.to_string()));
        }
        EnvFilter::try_new(level)
            .map(|_| ())
            .map_err(|e| invalid(e.to_string()))
    }

    /// Resolve `server.host` and `server.port` into the address to bind.
    ///
    /// IP literals (including bare IPv6 such as `::`) are used directly;
    /// anything else goes through the system resolver once at startup.
    pub fn get_socket_addr(&self) -> Result<SocketAddr> {
        let host = self.server.host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.server.port));
        }

        let invalid = |reason: String| Error::InvalidAddress {
            addr: format!("{}:{}", self.server.host, self.server.port),
            reason,
        };
        (host, self.server.port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host resolved to no addresses".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // Tests that read the process environment must not overlap with tests that set it
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_toml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_listen_on_all_interfaces_port_5000() {
        let cfg = Config::default();
        let addr = cfg.get_socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:5000");
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert!(cfg.http.server_name.starts_with("reqinfo/"));
    }

    #[test]
    fn test_load_without_file_matches_defaults() {
        let _guard = env_lock();
        let cfg = Config::load_from(None).unwrap();
        assert_eq!(cfg.server.port, Config::default().server.port);
        assert_eq!(cfg.server.backlog, 1024);
        assert_eq!(cfg.performance.connection_timeout, 30);
        assert_eq!(cfg.performance.max_connections, None);
    }

    #[test]
    fn test_load_from_toml_file() {
        let _guard = env_lock();
        let file = write_toml(
            "[server]\nhost = \"127.0.0.1\"\nport = 8088\nworkers = 2\n\n\
             [logging]\naccess_log_format = \"json\"\n\n\
             [performance]\nmax_connections = 64\n",
        );

        let cfg = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.server.workers, Some(2));
        assert_eq!(cfg.logging.access_log_format, "json");
        assert_eq!(cfg.performance.max_connections, Some(64));
        // untouched keys keep their defaults
        assert!(cfg.performance.keep_alive);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_env_overrides_file() {
        let _guard = env_lock();
        let file = write_toml("[server]\nport = 8088\n\n[logging]\naccess_log_format = \"common\"\n");

        std::env::set_var("REQINFO_SERVER__PORT", "8123");
        std::env::set_var("REQINFO_LOGGING__ACCESS_LOG_FORMAT", "json");
        let loaded = Config::load_from(Some(file.path()));
        std::env::remove_var("REQINFO_SERVER__PORT");
        std::env::remove_var("REQINFO_LOGGING__ACCESS_LOG_FORMAT");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.server.port, 8123);
        assert_eq!(cfg.logging.access_log_format, "json");
    }

    #[test]
    fn test_env_applies_without_file() {
        let _guard = env_lock();
        std::env::set_var("REQINFO_PERFORMANCE__MAX_CONNECTIONS", "16");
        let loaded = Config::load_from(None);
        std::env::remove_var("REQINFO_PERFORMANCE__MAX_CONNECTIONS");

        assert_eq!(loaded.unwrap().performance.max_connections, Some(16));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let _guard = env_lock();
        let path = Path::new("/nonexistent/reqinfo-missing.toml");
        assert!(matches!(Config::load_from(Some(path)), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_fixes_invalid_file_value() {
        let _guard = env_lock();
        let file = write_toml("[server]\nworkers = 0\nhost = \"not a host name!\"\n");

        let mut cfg = Config::load_from(Some(file.path())).unwrap();
        assert!(cfg.validate().is_err());

        let args = CliArgs {
            config: None,
            host: Some("127.0.0.1".to_string()),
            port: None,
            workers: Some(4),
            log_level: None,
        };
        cfg.apply_cli(&args);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.workers, Some(4));
    }

    #[test]
    fn test_ipv6_host_is_accepted() {
        let mut cfg = Config::default();
        cfg.server.host = "::".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "[::]:5000");

        cfg.server.host = "[::1]".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "[::1]:5000");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.server.backlog = 0;
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let mut cfg = Config::default();
        cfg.server.workers = Some(0);
        assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))));

        let mut cfg = Config::default();
        cfg.server.host = "not a host name!".to_string();
        assert!(matches!(cfg.validate(), Err(Error::InvalidAddress { .. })));
    }

    #[test]
    fn test_validate_log_level() {
        let mut cfg = Config::default();
        for level in ["debug", "OFF", "warn,access=off", "reqinfo=trace"] {
            cfg.logging.level = level.to_string();
            assert!(cfg.validate().is_ok(), "{level}");
        }

        for level in ["verbose", "reqinfo=verbose"] {
            cfg.logging.level = level.to_string();
            assert!(matches!(cfg.validate(), Err(Error::InvalidConfig(_))), "{level}");
        }
    }
    #[test]
    fn test_cli_overrides_loaded_values() {
        let mut cfg = Config::default();
        let args = CliArgs {
            config: None,
            host: Some("127.0.0.1".to_string()),
            port: Some(9000),
            workers: Some(4),
            log_level: Some("debug".to_string()),
        };
        cfg.apply_cli(&args);
        assert_eq!(cfg.get_socket_addr().unwrap().to_string(), "127.0.0.1:9000");
        assert_eq!(cfg.server.workers, Some(4));
        assert_eq!(cfg.logging.level, "debug");
    }
}
