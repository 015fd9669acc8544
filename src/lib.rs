//! Sharkfacts: random shark facts for chat webhooks.
//!
//! A fact file is read once at startup and each `POST /sharkfact` answers
//! with one uniformly random line, formatted as an in-channel message.

pub mod config;
pub mod error;
pub mod facts;
pub mod http;
pub mod logging;
pub mod middleware;
pub mod routes;
pub mod selector;
pub mod state;

pub use config::{Config, ConfigError, ConfigMode, ConfigSource};
pub use error::AppError;
pub use facts::{FactError, FactStore};
pub use routes::create_router;
pub use selector::{FactResponse, FormatMode};
pub use state::AppState;
