use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::AppConfig;

/// What `init_telemetry` installs for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub log_level: String,
    /// Jaeger agent to export spans to; spans stay local when `None`
    pub jaeger_agent: Option<String>,
}

impl TelemetryConfig {
    pub fn new(service_name: &str, config: &AppConfig) -> Self {
        Self {
            service_name: service_name.to_string(),
            log_level: config.log_level.clone(),
            jaeger_agent: config
                .tracing
                .enable_jaeger
                .then(|| config.tracing.jaeger_endpoint.clone()),
        }
    }

    pub fn exports_traces(&self) -> bool {
        self.jaeger_agent.is_some()
    }
}

/// Install JSON logging, plus span export to the Jaeger agent when configured.
///
/// `RUST_LOG` directives win over `log_level` when both are present.
pub fn init_telemetry(
    config: TelemetryConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let jaeger_layer = match &config.jaeger_agent {
        Some(agent) => {
            let tracer = opentelemetry_jaeger::new_agent_pipeline()
                .with_service_name(config.service_name.as_str())
                .with_endpoint(agent.as_str())
                .install_batch(opentelemetry_sdk::runtime::Tokio)?;
            Some(tracing_opentelemetry::layer().with_tracer(tracer))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_thread_ids(true).json())
        .with(jaeger_layer)
        .try_init()?;

    tracing::info!(
        service = %config.service_name,
        jaeger_agent = ?config.jaeger_agent,
        "Telemetry initialized"
    );

    Ok(())
}

/// Flush pending spans before the process exits
pub fn shutdown_telemetry() {
    global::shutdown_tracer_provider();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jaeger_disabled_by_default() {
        let config = TelemetryConfig::new("order-api", &AppConfig::default());
        assert_eq!(config.service_name, "order-api");
        assert_eq!(config.log_level, "info");
        assert!(!config.exports_traces());
    }

    #[test]
    fn test_jaeger_agent_from_app_config() {
        let mut app = AppConfig::default();
        app.tracing.enable_jaeger = true;

        let config = TelemetryConfig::new("order-api", &app);
        assert_eq!(config.jaeger_agent.as_deref(), Some("localhost:6831"));
    }

    #[test]
    fn test_init_telemetry_without_jaeger() {
        let config = TelemetryConfig::new("order-api", &AppConfig::default());
        assert!(init_telemetry(config).is_ok());
    }
}
