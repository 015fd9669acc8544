//! Fatal startup errors.
//!
//! Nothing here is recovered from: `main` prints the error and exits with
//! `AppError::exit_code`.

use crate::config::ConfigError;
use crate::facts::FactError;
use crate::http::ServerError;
use crate::logging::LoggingError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Facts(#[from] FactError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Server(#[from] ServerError),
}

impl AppError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(e) => e.exit_code(),
            AppError::Facts(_) | AppError::Logging(_) | AppError::Server(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_config_exit_codes_pass_through() {
        assert_eq!(AppError::from(ConfigError::NotFound).exit_code(), 1);
        assert_eq!(AppError::from(ConfigError::Validation(vec![])).exit_code(), 99);
    }

    #[test]
    fn test_fact_errors_exit_1() {
        let err = AppError::from(FactError::Empty(PathBuf::from("/facts.txt")));
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.to_string(), "Fact file /facts.txt contains no facts");
    }
}
