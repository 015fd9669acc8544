//! Configuration loading and constants.
//!
//! Configuration comes from one of two interchangeable sources: a YAML file
//! validated against a fixed schema, or the process environment with typed
//! defaults. Both produce the same `Config`, which is built once at startup
//! and shared read-only with every request handler.

pub mod env;
pub mod file;

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::path::PathBuf;

use const_format::formatcp;

use crate::logging::LoggingConfig;

pub use env::{EnvSource, EnvValue, Environment, ProcessEnv};
pub use file::FileSource;

// =============================================================================
// Config File Locations
// =============================================================================

/// Config file looked up relative to the working directory
pub const LOCAL_CONFIG_PATH: &str = "./sharkfacts.conf";

/// System-wide config file, used when no local file exists
pub const SYSTEM_CONFIG_PATH: &str = "/etc/sharkfacts/sharkfacts.conf";

/// Search order for the file source, first existing path wins
pub const CONFIG_SEARCH_PATHS: [&str; 2] = [LOCAL_CONFIG_PATH, SYSTEM_CONFIG_PATH];

pub const NO_CONFIG_MESSAGE: &str = formatcp!(
    "No valid config file. Please place one either in this directory or {}",
    SYSTEM_CONFIG_PATH
);

// =============================================================================
// Setting Keys
// =============================================================================

pub const KEY_FACT_FILE: &str = "FACT_FILE";
pub const KEY_BIND_IP: &str = "BIND_IP";
pub const KEY_BIND_PORT: &str = "BIND_PORT";
pub const KEY_LOG_FILE: &str = "LOG_FILE";
pub const KEY_LOG_TYPE: &str = "LOG_TYPE";
pub const KEY_LOG_LEVEL: &str = "LOG_LEVEL";
pub const KEY_LOG_FORMAT: &str = "LOG_FORMAT";

// =============================================================================
// Environment Defaults
// =============================================================================

pub const DEFAULT_FACT_FILE: &str = "/facts.txt";
pub const DEFAULT_BIND_IP: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: &str = "5000";
pub const DEFAULT_LOG_FILE: &str = "/tmp/sharkfacts.log";
pub const DEFAULT_LOG_TYPE: &str = "stdout";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_FORMAT: &str = "text";

// =============================================================================
// Exit Codes
// =============================================================================

/// No config file was found in any search location
pub const EXIT_NO_CONFIG: i32 = 1;

/// The config file exists but could not be read, parsed or validated
pub const EXIT_INVALID_CONFIG: i32 = 99;

/// Fully resolved run parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Path of the newline-delimited fact file
    pub fact_file: PathBuf,
    /// Host or address the HTTP listener binds to
    pub bind_ip: String,
    pub bind_port: u16,
    pub logging: LoggingConfig,
}

impl Config {
    /// Socket address for the HTTP listener.
    ///
    /// `bind_ip` may be an IPv4 or IPv6 literal (brackets optional) or a
    /// host name, which is resolved and the first address used.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let host = self
            .bind_ip
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']');

        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(SocketAddr::new(ip, self.bind_port));
        }

        let invalid = |reason: String| ConfigError::InvalidValue {
            key: KEY_BIND_IP,
            reason: format!("{:?} is not a valid bind address: {}", self.bind_ip, reason),
        };

        (host, self.bind_port)
            .to_socket_addrs()
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("host name resolved to no addresses".to_string()))
    }
}

/// Something that can produce a complete `Config`.
pub trait ConfigSource {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Resolve a fully populated configuration or fail; never partial.
    fn load(&self) -> Result<Config, ConfigError>;
}

/// Which configuration source a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ConfigMode {
    /// Schema-validated YAML file
    #[default]
    File,
    /// Process environment with defaults
    Env,
}

/// Resolve configuration for the given mode.
///
/// `explicit_path` only applies to the file source; it skips the search
/// through `CONFIG_SEARCH_PATHS`.
pub fn resolve(mode: ConfigMode, explicit_path: Option<PathBuf>) -> Result<Config, ConfigError> {
    match mode {
        ConfigMode::File => {
            let source = match explicit_path {
                Some(path) => FileSource::new(path),
                None => FileSource::locate()?,
            };
            load_from(&source)
        }
        ConfigMode::Env => load_from(&EnvSource::new(ProcessEnv)),
    }
}

fn load_from(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    tracing::debug!(source = source.name(), "Resolving configuration");
    source.load()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{}", NO_CONFIG_MESSAGE)]
    NotFound,

    #[error("Invalid config file: {}", .0.display())]
    Missing(PathBuf),

    #[error("Unable to open config file: {}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Error in config file ({}): {message}{}", .path.display(), format_position(.location))]
    Parse {
        path: PathBuf,
        message: String,
        /// 1-based line and column of the parse error, when known
        location: Option<(usize, usize)>,
    },

    #[error("Error in config.\n{}", .0.join("\n"))]
    Validation(Vec<String>),

    #[error("Missing required configuration key: {0}")]
    MissingKey(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },
}

impl ConfigError {
    /// Process exit status for a configuration failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConfigError::NotFound => EXIT_NO_CONFIG,
            ConfigError::Missing(_)
            | ConfigError::Unreadable { .. }
            | ConfigError::Parse { .. }
            | ConfigError::Validation(_) => EXIT_INVALID_CONFIG,
            ConfigError::MissingKey(_) | ConfigError::InvalidValue { .. } => 1,
        }
    }
}

fn format_position(location: &Option<(usize, usize)>) -> String {
    match location {
        Some((line, column)) => format!("\nError position: ({}:{})", line, column),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            fact_file: PathBuf::from("/facts.txt"),
            bind_ip: "127.0.0.1".to_string(),
            bind_port: 5000,
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn test_bind_addr() {
        let addr = sample().bind_addr().unwrap();
        assert_eq!(addr, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_bind_addr_ipv6_unspecified() {
        let mut config = sample();
        config.bind_ip = "::".to_string();
        let addr = config.bind_addr().unwrap();
        assert_eq!(addr, SocketAddr::new("::".parse().unwrap(), 5000));
    }

    #[test]
    fn test_bind_addr_bracketed_ipv6() {
        let mut config = sample();
        config.bind_ip = "[::1]".to_string();
        assert_eq!(config.bind_addr().unwrap(), "[::1]:5000".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn test_bind_addr_resolves_localhost() {
        let mut config = sample();
        config.bind_ip = "localhost".to_string();
        let addr = config.bind_addr().unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 5000);
    }

    #[test]
    fn test_bind_addr_rejects_hostname_garbage() {
        let mut config = sample();
        config.bind_ip = "not an address".to_string();
        let err = config.bind_addr().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: KEY_BIND_IP, .. }));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ConfigError::NotFound.exit_code(), 1);
        assert_eq!(ConfigError::Missing(PathBuf::from("x")).exit_code(), 99);
        assert_eq!(ConfigError::Validation(vec![]).exit_code(), 99);
        assert_eq!(ConfigError::MissingKey("FACT_FILE".into()).exit_code(), 1);
    }

    #[test]
    fn test_parse_error_includes_position() {
        let err = ConfigError::Parse {
            path: PathBuf::from("sharkfacts.conf"),
            message: "did not find expected key".to_string(),
            location: Some((3, 7)),
        };
        let rendered = err.to_string();
        assert!(rendered.starts_with("Error in config file (sharkfacts.conf): did not find expected key"));
        assert!(rendered.ends_with("Error position: (3:7)"));
    }

    #[test]
    fn test_validation_error_lists_every_violation() {
        let err = ConfigError::Validation(vec![
            "BIND_PORT: must be of integer type".to_string(),
            "FACT_FILE: required field".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Error in config.\nBIND_PORT: must be of integer type\nFACT_FILE: required field"
        );
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            ConfigError::NotFound.to_string(),
            "No valid config file. Please place one either in this directory or /etc/sharkfacts/sharkfacts.conf"
        );
    }
}
