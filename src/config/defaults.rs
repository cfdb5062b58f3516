//! Default value functions for configuration.
//!
//! The ring parameters must match the cluster's own configuration exactly,
//! otherwise client and nodes disagree on preference lists.

// =============================================================================
// Ring Defaults
// =============================================================================

pub fn default_hash_space_size() -> u64 {
    65536
}

pub fn default_preference_list_size() -> usize {
    3
}

pub fn default_key_prefix() -> String {
    "shoppinglist_".to_string()
}

// =============================================================================
// Connection Defaults
// =============================================================================

/// Nodes serve client sockets on their ring port plus this offset.
pub fn default_port_offset() -> u16 {
    3000
}

pub fn default_socket_path() -> String {
    "/ws".to_string()
}

pub fn default_connect_timeout_ms() -> u64 {
    500
}

pub fn default_request_timeout_ms() -> u64 {
    2000
}

pub fn default_refresh_interval_secs() -> u64 {
    30
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_filter() -> String {
    "info".to_string()
}
