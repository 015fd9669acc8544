//! YAML config file source.
//!
//! The file is a flat mapping validated against a closed schema. Every
//! violation is collected before failing so operators can fix the file in
//! one pass.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use super::{
    Config, ConfigError, ConfigSource, CONFIG_SEARCH_PATHS, KEY_BIND_IP, KEY_BIND_PORT,
    KEY_FACT_FILE, KEY_LOG_FILE, KEY_LOG_FORMAT, KEY_LOG_LEVEL,
};
use crate::logging::{LogFormat, LogLevel, LoggingConfig};

/// Every key the schema accepts
const SCHEMA_KEYS: [&str; 6] = [
    KEY_LOG_FILE,
    KEY_FACT_FILE,
    KEY_BIND_IP,
    KEY_BIND_PORT,
    KEY_LOG_LEVEL,
    KEY_LOG_FORMAT,
];

/// Configuration read from a YAML file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Use the first existing file from the standard search locations.
    pub fn locate() -> Result<Self, ConfigError> {
        Self::locate_in(&CONFIG_SEARCH_PATHS)
    }

    /// Use the first existing file from `candidates`.
    pub fn locate_in<P: AsRef<Path>>(candidates: &[P]) -> Result<Self, ConfigError> {
        candidates
            .iter()
            .map(|candidate| candidate.as_ref())
            .find(|path| path.exists())
            .map(Self::new)
            .ok_or(ConfigError::NotFound)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    fn load(&self) -> Result<Config, ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::Missing(self.path.clone()));
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|source| ConfigError::Unreadable {
                path: self.path.clone(),
                source,
            })?;

        let config = parse(&self.path, &contents)?;
        tracing::debug!(path = %self.path.display(), "Loaded config file");
        Ok(config)
    }
}

/// Parse and validate config file contents. `path` is only used in errors.
pub fn parse(path: &Path, contents: &str) -> Result<Config, ConfigError> {
    let document: Value = serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
        location: e.location().map(|loc| (loc.line(), loc.column())),
    })?;

    validate(&document).map_err(ConfigError::Validation)
}

/// Check `document` against the schema and build a `Config` from it.
fn validate(document: &Value) -> Result<Config, Vec<String>> {
    let Some(mapping) = document.as_mapping() else {
        return Err(vec![
            "config document must be a mapping of keys to values".to_string()
        ]);
    };

    let mut violations = Vec::new();

    let log_file = required_string(mapping, KEY_LOG_FILE, &mut violations);
    let fact_file = required_string(mapping, KEY_FACT_FILE, &mut violations);
    let bind_ip = required_string(mapping, KEY_BIND_IP, &mut violations);
    let bind_port = required_port(mapping, &mut violations);

    let level = optional_string(mapping, KEY_LOG_LEVEL, &mut violations)
        .map(|raw| raw.parse::<LogLevel>())
        .transpose()
        .unwrap_or_else(|e| {
            violations.push(format!("{}: {}", KEY_LOG_LEVEL, e));
            None
        })
        .unwrap_or_default();

    let format = optional_string(mapping, KEY_LOG_FORMAT, &mut violations)
        .map(|raw| raw.parse::<LogFormat>())
        .transpose()
        .unwrap_or_else(|e| {
            violations.push(format!("{}: {}", KEY_LOG_FORMAT, e));
            None
        })
        .unwrap_or_default();

    for key in mapping.keys() {
        match key.as_str() {
            Some(name) if SCHEMA_KEYS.contains(&name) => {}
            Some(name) => violations.push(format!("{}: unknown field", name)),
            None => violations.push(format!("{}: unknown field", render(key))),
        }
    }

    match (log_file, fact_file, bind_ip, bind_port) {
        (Some(log_file), Some(fact_file), Some(bind_ip), Some(bind_port))
            if violations.is_empty() =>
        {
            Ok(Config {
                fact_file: PathBuf::from(fact_file),
                bind_ip,
                bind_port,
                logging: LoggingConfig::file_only(Path::new(&log_file), level, format),
            })
        }
        _ => Err(violations),
    }
}

fn required_string(mapping: &Mapping, key: &str, violations: &mut Vec<String>) -> Option<String> {
    match mapping.get(key) {
        None => {
            violations.push(format!("{}: required field", key));
            None
        }
        Some(value) => expect_string(key, value, violations),
    }
}

fn optional_string(mapping: &Mapping, key: &str, violations: &mut Vec<String>) -> Option<String> {
    mapping
        .get(key)
        .and_then(|value| expect_string(key, value, violations))
}

fn expect_string(key: &str, value: &Value, violations: &mut Vec<String>) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        _ => {
            violations.push(format!("{}: must be of string type", key));
            None
        }
    }
}

fn required_port(mapping: &Mapping, violations: &mut Vec<String>) -> Option<u16> {
    let Some(value) = mapping.get(KEY_BIND_PORT) else {
        violations.push(format!("{}: required field", KEY_BIND_PORT));
        return None;
    };

    let Value::Number(number) = value else {
        violations.push(format!("{}: must be of integer type", KEY_BIND_PORT));
        return None;
    };

    if !(number.is_u64() || number.is_i64()) {
        violations.push(format!("{}: must be of integer type", KEY_BIND_PORT));
        return None;
    }

    match number.as_u64().and_then(|n| u16::try_from(n).ok()) {
        Some(port) => Some(port),
        None => {
            violations.push(format!(
                "{}: {} is not a valid port (0-65535)",
                KEY_BIND_PORT, number
            ));
            None
        }
    }
}

fn render(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{:?}", value))
}
