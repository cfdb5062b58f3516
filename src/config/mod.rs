//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: config struct definitions (Config, CoordinatorConfig, LoggingConfig)
//! - [`defaults`]: serde default functions
//! - [`validation`]: startup checks that report every problem at once

pub mod defaults;
mod types;
pub mod validation;

pub use types::{Config, ConfigError, CoordinatorConfig, LoggingConfig};
