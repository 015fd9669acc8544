//! Logging configuration and subscriber setup.
//!
//! Both configuration sources describe logging as a level, an output format
//! and a list of sinks. `init` turns that description into a `tracing`
//! subscriber with one formatting layer per sink.

#[cfg(unix)]
pub mod syslog;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use tracing_subscriber::fmt::{self, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Crate-level targets the default filter applies to
const LOG_TARGETS: [&str; 2] = [env!("CARGO_CRATE_NAME"), "tower_http"];

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Severity threshold, named the way operators write it in config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// `tracing` directive for this level. `tracing` has no level above
    /// ERROR, so `Critical` shares it.
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error | LogLevel::Critical => "error",
        }
    }

    /// Filter used when neither the CLI nor `RUST_LOG` supplies one.
    pub fn default_filter(self) -> String {
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, self.as_directive()))
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl FromStr for LogLevel {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" | "warn" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            _ => Err(ParseSettingError {
                kind: "log level",
                value: s.to_string(),
                expected: "debug, info, warning, error, critical",
            }),
        }
    }
}

/// Output encoding shared by every sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = ParseSettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ParseSettingError {
                kind: "log format",
                value: s.to_string(),
                expected: "text, json",
            }),
        }
    }
}

/// Where log events are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Standard output
    Console,
    /// Local syslog daemon via `/dev/log`
    Syslog,
    /// Appends to the given file
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub sinks: Vec<LogSink>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::default(),
            format: LogFormat::default(),
            sinks: vec![LogSink::Console],
        }
    }
}

impl LoggingConfig {
    /// Console output plus whatever `log_type` adds.
    ///
    /// `syslog` adds the syslog sink and `file` adds a file sink at
    /// `log_file`. Any other value, `stdout` included, leaves the console
    /// as the only sink.
    pub fn for_log_type(log_type: &str, log_file: &Path, level: LogLevel, format: LogFormat) -> Self {
        let mut sinks = vec![LogSink::Console];
        match log_type {
            "syslog" => sinks.push(LogSink::Syslog),
            "file" => sinks.push(LogSink::File(log_file.to_path_buf())),
            _ => {}
        }
        Self { level, format, sinks }
    }

    /// A single file sink, as used by file-based configuration.
    pub fn file_only(log_file: &Path, level: LogLevel, format: LogFormat) -> Self {
        Self {
            level,
            format,
            sinks: vec![LogSink::File(log_file.to_path_buf())],
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind} {value:?} (expected one of: {expected})")]
pub struct ParseSettingError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to open log file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to connect to syslog: {0}")]
    Syslog(#[source] std::io::Error),

    #[error("Failed to install log subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),
}

/// Install the global subscriber.
///
/// Filter priority: `override_filter` (CLI) > `RUST_LOG` > the configured level.
pub fn init(config: &LoggingConfig, override_filter: Option<String>) -> Result<(), LoggingError> {
    let filter = override_filter
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| config.level.default_filter());

    let layers = config
        .sinks
        .iter()
        .map(|sink| build_layer(sink, config.format))
        .collect::<Result<Vec<_>, _>>()?;

    tracing_subscriber::registry()
        .with(layers)
        .with(EnvFilter::new(&filter))
        .try_init()?;

    Ok(())
}

fn build_layer(sink: &LogSink, format: LogFormat) -> Result<BoxedLayer, LoggingError> {
    match sink {
        LogSink::Console => Ok(formatted(std::io::stdout, true, format)),
        LogSink::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::File {
                    path: path.clone(),
                    source,
                })?;
            Ok(formatted(Mutex::new(file), false, format))
        }
        #[cfg(unix)]
        LogSink::Syslog => {
            let writer = syslog::Syslog::connect().map_err(LoggingError::Syslog)?;
            Ok(formatted(writer, false, format))
        }
        #[cfg(not(unix))]
        LogSink::Syslog => Err(LoggingError::Syslog(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            "syslog sink requires a unix platform",
        ))),
    }
}

fn formatted<W>(writer: W, ansi: bool, format: LogFormat) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Text => layer.boxed(),
        LogFormat::Json => layer.json().boxed(),
    }
}
