//! Integration test common infrastructure.
//!
//! Provides an in-process WebSocket node that answers client requests with a
//! scripted handler, and helpers for building coordinator configs that point
//! at it.

pub mod node;

#[allow(unused_imports)]
pub use node::{Reply, TestNode, silent_listener};

use trolley::CoordinatorConfig;

/// Coordinator config for local test nodes: no port offset, short timeouts.
#[allow(dead_code)]
pub fn test_config() -> CoordinatorConfig {
    CoordinatorConfig {
        port_offset: 0,
        connect_timeout_ms: 300,
        request_timeout_ms: 500,
        refresh_interval_secs: 0,
        ..CoordinatorConfig::default()
    }
}
