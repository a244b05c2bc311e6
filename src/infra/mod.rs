pub mod config;
pub mod telemetry;

pub use config::{AppConfig, ConfigError, LogFormat};
pub use telemetry::init_tracing;
