//! Environment variable config source.
//!
//! Every setting has a default, so an empty environment yields a usable
//! configuration. Resolved values are written back to the environment so
//! later lookups of the same key see exactly what the service runs with.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use super::{
    Config, ConfigError, ConfigSource, DEFAULT_BIND_IP, DEFAULT_BIND_PORT, DEFAULT_FACT_FILE,
    DEFAULT_LOG_FILE, DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL, DEFAULT_LOG_TYPE, KEY_BIND_IP,
    KEY_BIND_PORT, KEY_FACT_FILE, KEY_LOG_FILE, KEY_LOG_FORMAT, KEY_LOG_LEVEL, KEY_LOG_TYPE,
};
use crate::logging::{LogFormat, LogLevel, LoggingConfig};

/// Key/value namespace the environment source reads from and writes to.
pub trait Environment {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

impl Environment for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<String> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.insert(key.to_string(), value.to_string());
    }
}

/// A setting after boolean coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvValue {
    Bool(bool),
    Str(String),
}

impl EnvValue {
    /// Turn boolean-looking strings into booleans.
    ///
    /// `true`/`t` and `false`/`f` match case-insensitively. Anything else is
    /// kept as the original string; this never fails.
    pub fn coerce(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "true" | "t" => EnvValue::Bool(true),
            "false" | "f" => EnvValue::Bool(false),
            _ => EnvValue::Str(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            EnvValue::Str(s) => Some(s),
            EnvValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for EnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnvValue::Bool(b) => write!(f, "{}", b),
            EnvValue::Str(s) => f.write_str(s),
        }
    }
}

/// Look up `key`, falling back to `default`, and write the result back.
///
/// A required key that is absent fails even when a default is given. An
/// optional key with no default and no value also fails, since there is
/// nothing to resolve it to.
pub fn resolve_value<E: Environment + ?Sized>(
    env: &mut E,
    key: &str,
    required: bool,
    default: Option<&str>,
) -> Result<EnvValue, ConfigError> {
    let raw = match env.get(key) {
        Some(raw) => raw,
        None if required => return Err(ConfigError::MissingKey(key.to_string())),
        None => match default {
            Some(default) => default.to_string(),
            None => return Err(ConfigError::MissingKey(key.to_string())),
        },
    };

    let value = EnvValue::coerce(&raw);
    env.set(key, &value.to_string());
    Ok(value)
}

/// Configuration read from environment variables.
///
/// Resolution writes back to the environment, so the environment lives in
/// a `RefCell` to keep `ConfigSource::load` callable through `&self`.
#[derive(Debug)]
pub struct EnvSource<E> {
    env: RefCell<E>,
}

impl<E: Environment> EnvSource<E> {
    pub fn new(env: E) -> Self {
        Self {
            env: RefCell::new(env),
        }
    }

    pub fn into_inner(self) -> E {
        self.env.into_inner()
    }

    fn value(&self, key: &str, default: &str) -> Result<EnvValue, ConfigError> {
        resolve_value(&mut *self.env.borrow_mut(), key, false, Some(default))
    }

    fn string(&self, key: &'static str, default: &str) -> Result<String, ConfigError> {
        match self.value(key, default)? {
            EnvValue::Str(s) => Ok(s),
            EnvValue::Bool(b) => Err(ConfigError::InvalidValue {
                key,
                reason: format!("expected a string, got boolean {}", b),
            }),
        }
    }
}

impl<E: Environment> ConfigSource for EnvSource<E> {
    fn name(&self) -> &'static str {
        "env"
    }

    fn load(&self) -> Result<Config, ConfigError> {
        let fact_file = self.string(KEY_FACT_FILE, DEFAULT_FACT_FILE)?;
        let bind_ip = self.string(KEY_BIND_IP, DEFAULT_BIND_IP)?;

        let raw_port = self.string(KEY_BIND_PORT, DEFAULT_BIND_PORT)?;
        let bind_port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue {
                key: KEY_BIND_PORT,
                reason: format!("{:?} is not a valid port: {}", raw_port, e),
            })?;

        let log_file = self.string(KEY_LOG_FILE, DEFAULT_LOG_FILE)?;

        let level = self
            .string(KEY_LOG_LEVEL, DEFAULT_LOG_LEVEL)?
            .parse::<LogLevel>()
            .map_err(|e| ConfigError::InvalidValue {
                key: KEY_LOG_LEVEL,
                reason: e.to_string(),
            })?;

        let format = self
            .string(KEY_LOG_FORMAT, DEFAULT_LOG_FORMAT)?
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidValue {
                key: KEY_LOG_FORMAT,
                reason: e.to_string(),
            })?;

        // Unrecognized log types, booleans included, mean console only.
        let log_type = self.value(KEY_LOG_TYPE, DEFAULT_LOG_TYPE)?;
        let logging = LoggingConfig::for_log_type(
            log_type.as_str().unwrap_or_default(),
            Path::new(&log_file),
            level,
            format,
        );

        Ok(Config {
            fact_file: PathBuf::from(fact_file),
            bind_ip,
            bind_port,
            logging,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogSink;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_coerce_true_tokens() {
        for raw in ["true", "True", "TRUE", "t", "T"] {
            assert_eq!(EnvValue::coerce(raw), EnvValue::Bool(true), "{}", raw);
        }
    }

    #[test]
    fn test_coerce_false_tokens() {
        for raw in ["false", "False", "f", "F"] {
            assert_eq!(EnvValue::coerce(raw), EnvValue::Bool(false), "{}", raw);
        }
    }

    #[test]
    fn test_coerce_leaves_other_strings_alone() {
        for raw in ["yes", "0", "1", "", "tru", "/facts.txt", " true"] {
            assert_eq!(EnvValue::coerce(raw), EnvValue::Str(raw.to_string()), "{:?}", raw);
        }
    }

    #[test]
    fn test_required_key_missing() {
        let mut vars = env(&[]);
        let err = resolve_value(&mut vars, "FACT_FILE", true, Some("/facts.txt")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingKey(ref key) if key == "FACT_FILE"));
    }

    #[test]
    fn test_optional_key_without_default_is_missing() {
        let mut vars = env(&[]);
        assert!(resolve_value(&mut vars, "BIND_IP", false, None).is_err());
    }

    #[test]
    fn test_default_is_written_back() {
        let mut vars = env(&[]);
        let value = resolve_value(&mut vars, "BIND_PORT", false, Some("5000")).unwrap();
        assert_eq!(value, EnvValue::Str("5000".to_string()));
        assert_eq!(vars.get("BIND_PORT").map(String::as_str), Some("5000"));
    }

    #[test]
    fn test_coerced_value_written_back_stringified() {
        let mut vars = env(&[("DEBUG", "T")]);
        let value = resolve_value(&mut vars, "DEBUG", true, None).unwrap();
        assert_eq!(value, EnvValue::Bool(true));
        assert_eq!(vars.get("DEBUG").map(String::as_str), Some("true"));
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let source = EnvSource::new(env(&[]));
        let config = source.load().unwrap();

        assert_eq!(config.fact_file, PathBuf::from("/facts.txt"));
        assert_eq!(config.bind_ip, "0.0.0.0");
        assert_eq!(config.bind_port, 5000);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Text);
        assert_eq!(config.logging.sinks, vec![LogSink::Console]);

        let vars = source.into_inner();
        assert_eq!(vars.get("LOG_TYPE").map(String::as_str), Some("stdout"));
        assert_eq!(vars.get("LOG_FILE").map(String::as_str), Some("/tmp/sharkfacts.log"));
    }

    #[test]
    fn test_bind_port_from_environment() {
        let config = EnvSource::new(env(&[("BIND_PORT", "8080")])).load().unwrap();
        assert_eq!(config.bind_port, 8080);
    }

    #[test]
    fn test_ipv6_wildcard_bind_ip_is_bindable() {
        let config = EnvSource::new(env(&[("BIND_IP", "::"), ("BIND_PORT", "8080")]))
            .load()
            .unwrap();
        let addr = config.bind_addr().unwrap();
        assert!(addr.ip().is_unspecified());
        assert!(addr.is_ipv6());
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_bind_port_must_be_numeric() {
        let err = EnvSource::new(env(&[("BIND_PORT", "eighty")])).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "BIND_PORT", .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_boolean_fact_file_rejected() {
        let err = EnvSource::new(env(&[("FACT_FILE", "t")])).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "FACT_FILE", .. }));
    }

    #[test]
    fn test_file_log_type() {
        let config = EnvSource::new(env(&[("LOG_TYPE", "file"), ("LOG_FILE", "/var/log/s.log")]))
            .load()
            .unwrap();
        assert_eq!(
            config.logging.sinks,
            vec![LogSink::Console, LogSink::File(PathBuf::from("/var/log/s.log"))]
        );
    }

    #[test]
    fn test_syslog_log_type() {
        let config = EnvSource::new(env(&[("LOG_TYPE", "syslog")])).load().unwrap();
        assert_eq!(config.logging.sinks, vec![LogSink::Console, LogSink::Syslog]);
    }

    #[test]
    fn test_boolean_log_type_falls_back_to_console() {
        let config = EnvSource::new(env(&[("LOG_TYPE", "true")])).load().unwrap();
        assert_eq!(config.logging.sinks, vec![LogSink::Console]);
    }

    #[test]
    fn test_log_level_and_format() {
        let config = EnvSource::new(env(&[("LOG_LEVEL", "critical"), ("LOG_FORMAT", "json")]))
            .load()
            .unwrap();
        assert_eq!(config.logging.level, LogLevel::Critical);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let err = EnvSource::new(env(&[("LOG_LEVEL", "chatty")])).load().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "LOG_LEVEL", .. }));
    }

    #[test]
    fn test_process_env_write_back() {
        let mut env = ProcessEnv;
        let key = "SHARKFACTS_TEST_PROCESS_ENV_WRITE_BACK";
        std::env::remove_var(key);

        let value = resolve_value(&mut env, key, false, Some("F")).unwrap();
        assert_eq!(value, EnvValue::Bool(false));
        assert_eq!(std::env::var(key).unwrap(), "false");

        std::env::remove_var(key);
    }
}
