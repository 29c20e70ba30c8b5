pub mod config;
pub mod metrics;
pub mod telemetry;

pub use config::{AppConfig, CacheConfig, ConfigError, DatabaseConfig, ServerConfig, TracingConfig};
