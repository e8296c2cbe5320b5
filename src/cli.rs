//! Command-line arguments.
//!
//! Flags take precedence over the config file and `REQINFO_*` environment.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reqinfo")]
#[command(version)]
#[command(about = "Echoes client address, protocol and client-hint headers as JSON", long_about = None)]
pub struct CliArgs {
    /// Path to a configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to bind to (e.g. 0.0.0.0 or ::)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Number of worker threads (defaults to number of CPU cores)
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_flags() {
        let args = CliArgs::parse_from([
            "reqinfo",
            "--config",
            "/etc/reqinfo.toml",
            "--host",
            "::",
            "-p",
            "8080",
            "-w",
            "3",
            "--log-level",
            "debug",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("/etc/reqinfo.toml")));
        assert_eq!(args.host.as_deref(), Some("::"));
        assert_eq!(args.port, Some(8080));
        assert_eq!(args.workers, Some(3));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_no_flags_leaves_everything_unset() {
        let args = CliArgs::parse_from(["reqinfo"]);
        assert!(args.config.is_none());
        assert!(args.host.is_none());
        assert!(args.port.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_port() {
        assert!(CliArgs::try_parse_from(["reqinfo", "--port", "70000"]).is_err());
    }
}
