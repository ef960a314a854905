//! Service configuration from environment variables.

use admission_control::AdmissionConfig;
pub use service_config::ConfigError;
use service_config::{apply_shared_env, override_from_env, validate_shared};
use shared_bus::BrokerConfig;

/// Everything the media service binary needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Shared counter store
    pub redis_url: String,
    pub broker: BrokerConfig,
    pub admission: AdmissionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3003,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broker: BrokerConfig::default(),
            // Media reads only; no route spends the sensitive budget.
            admission: AdmissionConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration, overriding defaults from the environment.
    ///
    /// Reads `PORT` (default: 3003) plus the variables shared by every
    /// service, see [`service_config`].
    pub fn from_env() -> Self {
        let mut config = Self::default();

        override_from_env("PORT", &mut config.port);
        apply_shared_env(
            &mut config.redis_url,
            &mut config.broker,
            &mut config.admission,
        );

        config
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_shared(&self.redis_url, &self.broker, &self.admission)
    }
}
