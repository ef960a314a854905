//! Service configuration from environment variables.

use admission_control::AdmissionConfig;
pub use service_config::ConfigError;
use service_config::{apply_shared_env, override_from_env, validate_shared};
use shared_bus::BrokerConfig;
use shared_cache::CacheConfig;

/// Routes that spend the sensitive admission budget.
pub const SENSITIVE_ROUTES: [&str; 2] = ["/api/posts/create-post", "/api/posts/delete-post/:id"];

/// Everything the post service binary needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// HTTP listen port
    pub port: u16,
    /// Shared cache and counter store
    pub redis_url: String,
    pub broker: BrokerConfig,
    pub cache: CacheConfig,
    pub admission: AdmissionConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 3002,
            redis_url: "redis://127.0.0.1:6379".to_string(),
            broker: BrokerConfig::default(),
            cache: CacheConfig::default(),
            admission: AdmissionConfig {
                sensitive_routes: SENSITIVE_ROUTES.iter().map(|r| r.to_string()).collect(),
                ..AdmissionConfig::default()
            },
        }
    }
}

impl ServiceConfig {
    /// Load configuration, overriding defaults from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `PORT`: HTTP port (default: 3002)
    /// - `REDIS_URL`: cache and counter store
    /// - `RABBITMQ_URL`: broker URL
    /// - `EXCHANGE_NAME`: topic exchange (default: post_events)
    /// - `RATE_LIMIT_POINTS` / `RATE_LIMIT_DURATION_SECS`: global tier
    /// - `SENSITIVE_LIMIT_MAX` / `SENSITIVE_LIMIT_WINDOW_SECS`: sensitive tier
    /// - `TRUSTED_PROXIES`: peers whose forwarding headers name the client
    ///
    /// Unparseable values are logged and ignored.
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

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_shared(&self.redis_url, &self.broker, &self.admission)?;
        self.cache.validate()?;
        Ok(())
    }
}
