//! Core types, configuration, and settings for VaultPass.

mod config;
mod error;
mod logging;
mod paths;
mod settings;

pub use config::{Config, DEFAULT_LOG_LEVEL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
pub use settings::{Settings, DEFAULT_AUTH_METHOD};
