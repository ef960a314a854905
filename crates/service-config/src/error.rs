//! Configuration errors shared by the service binaries.

use admission_control::{AdmissionConfig, AdmissionConfigError};
use shared_bus::config::BrokerConfigError;
use shared_bus::BrokerConfig;
use shared_cache::CacheConfigError;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error(transparent)]
    Broker(#[from] BrokerConfigError),

    #[error(transparent)]
    Cache(#[from] CacheConfigError),

    #[error(transparent)]
    Admission(#[from] AdmissionConfigError),
}

/// Validate the sections every service shares.
pub fn validate_shared(
    redis_url: &str,
    broker: &BrokerConfig,
    admission: &AdmissionConfig,
) -> Result<(), ConfigError> {
    if redis_url.is_empty() {
        return Err(ConfigError::Invalid("REDIS_URL cannot be empty".into()));
    }
    broker.validate()?;
    admission.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(validate_shared(
            "redis://127.0.0.1:6379",
            &BrokerConfig::default(),
            &AdmissionConfig::default()
        )
        .is_ok());
    }

    #[test]
    fn test_empty_redis_url_rejected() {
        let result = validate_shared("", &BrokerConfig::default(), &AdmissionConfig::default());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_section_errors_keep_their_kind() {
        let broker = BrokerConfig {
            exchange: String::new(),
            ..BrokerConfig::default()
        };
        let result = validate_shared("redis://x", &broker, &AdmissionConfig::default());
        assert!(matches!(result, Err(ConfigError::Broker(_))));

        let mut admission = AdmissionConfig::default();
        admission.sensitive.points = 0;
        let result = validate_shared("redis://x", &BrokerConfig::default(), &admission);
        assert!(matches!(result, Err(ConfigError::Admission(_))));
    }
}
