//! Process-wide configuration.
//!
//! Parsed once at startup from command-line flags, each of which can also be
//! supplied through its environment variable. Core modules never read the
//! environment themselves; they receive the slices they need from here.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use log::LevelFilter;

use crate::logging::LogFormat;
use crate::{Error, LaunchConfig, Result};

#[derive(Debug, Clone, Parser)]
#[command(name = "domhtml", version, about = "Serve the rendered DOM of any http(s) page")]
pub struct Config {
    /// Address to bind
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 80)]
    pub port: u16,

    /// Chrome executable used when default discovery finds none
    #[arg(long, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Run Chrome without its sandbox (needed in most containers)
    #[arg(long, env = "CHROME_NO_SANDBOX")]
    pub no_sandbox: bool,

    /// Navigation timeout for browser renders, in milliseconds
    #[arg(long, env = "NAVIGATION_TIMEOUT_MS", default_value_t = 30000)]
    pub navigation_timeout_ms: u64,

    /// Timeout for static fetches, in milliseconds
    #[arg(long, env = "FETCH_TIMEOUT_MS", default_value_t = 30000)]
    pub fetch_timeout_ms: u64,

    /// Minimum log level (off, error, warn, info, debug, trace)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LevelFilter,

    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Config {
    /// Socket address the server binds to
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| Error::ConfigError(format!("invalid host {:?}: {}", self.host, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// The slice of configuration the browser launcher consumes
    pub fn launch_config(&self) -> LaunchConfig {
        LaunchConfig {
            chrome_path: self.chrome_path.clone(),
            sandbox: !self.no_sandbox,
            navigation_timeout: Duration::from_millis(self.navigation_timeout_ms),
        }
    }
}
