//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use crate::ring::split_node_id;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("seeds must list at least one node")]
    NoSeeds,
    #[error("seed '{0}' is not a host:port node id")]
    InvalidSeed(String),
    #[error("coordinator.hash_space_size must be positive")]
    ZeroHashSpace,
    #[error("coordinator.preference_list_size must be positive")]
    ZeroPreferenceListSize,
    #[error("coordinator.connect_timeout_ms must be positive")]
    ZeroConnectTimeout,
    #[error("coordinator.key_prefix must not be empty")]
    EmptyKeyPrefix,
    #[error("coordinator.socket_path must start with '/', got '{0}'")]
    InvalidSocketPath(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.seeds.is_empty() {
        errors.push(ValidationError::NoSeeds);
    }
    for seed in &config.seeds {
        if split_node_id(seed).is_err() {
            errors.push(ValidationError::InvalidSeed(seed.clone()));
        }
    }

    let coordinator = &config.coordinator;
    if coordinator.hash_space_size == 0 {
        errors.push(ValidationError::ZeroHashSpace);
    }
    if coordinator.preference_list_size == 0 {
        errors.push(ValidationError::ZeroPreferenceListSize);
    }
    if coordinator.connect_timeout_ms == 0 {
        errors.push(ValidationError::ZeroConnectTimeout);
    }
    if coordinator.key_prefix.is_empty() {
        errors.push(ValidationError::EmptyKeyPrefix);
    }
    if !coordinator.socket_path.starts_with('/') {
        errors.push(ValidationError::InvalidSocketPath(
            coordinator.socket_path.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
