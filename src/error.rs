//! Unified error handling for trolley.
//!
//! Each layer has its own error enum with a static `error_code()` used as a
//! structured logging field.

use thiserror::Error;
use tokio_tungstenite::tungstenite;
use trolley_proto::ProtoError;

// ============================================================================
// Socket Errors (connection and request/response)
// ============================================================================

/// Errors from a [`ProtocolSocket`](crate::socket::ProtocolSocket).
#[derive(Debug, Error)]
pub enum SocketError {
    /// The socket is the placeholder, was never connected, or is closed.
    #[error("not connected")]
    NotConnected,

    #[error("connect to {url} timed out after {timeout_ms}ms")]
    ConnectTimeout { url: String, timeout_ms: u64 },

    #[error("handshake with {url} failed: {source}")]
    Handshake {
        url: String,
        #[source]
        source: Box<tungstenite::Error>,
    },

    /// The connection closed while a request was waiting for its answer.
    #[error("connection lost")]
    ConnectionLost,

    #[error("wire error: {0}")]
    Proto(#[from] ProtoError),

    /// The node answered with `ok = false`.
    #[error("request rejected by node: {0}")]
    Rejected(String),

    /// The node answered with a payload of the wrong kind.
    #[error("unexpected response: expected {0}")]
    UnexpectedResponse(&'static str),
}

impl SocketError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotConnected => "not_connected",
            Self::ConnectTimeout { .. } => "connect_timeout",
            Self::Handshake { .. } => "handshake_failed",
            Self::ConnectionLost => "connection_lost",
            Self::Proto(_) => "wire_error",
            Self::Rejected(_) => "rejected",
            Self::UnexpectedResponse(_) => "unexpected_response",
        }
    }

    /// Whether the failure concerns reaching the node at all, as opposed to
    /// what it answered.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::NotConnected
                | Self::ConnectTimeout { .. }
                | Self::Handshake { .. }
                | Self::ConnectionLost
        )
    }
}

// ============================================================================
// Address Errors (node id to URL)
// ============================================================================

/// A node identifier that does not map to a socket address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("node id '{0}' has no ':port' suffix")]
    MissingPort(String),

    #[error("node id '{0}' has an empty host")]
    MissingHost(String),

    #[error("node id '{node}' has an invalid port '{port}'")]
    InvalidPort { node: String, port: String },

    #[error("node id '{node}': port {port} + offset {offset} exceeds 65535")]
    PortOverflow { node: String, port: u16, offset: u16 },
}

// ============================================================================
// Coordinator Errors
// ============================================================================

/// Errors surfaced by the [`RingCoordinator`](crate::ring::RingCoordinator).
///
/// Single-node failures never show up here; the coordinator moves on to the
/// next candidate and only reports exhaustion.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error("at least one seed node is required")]
    NoSeeds,

    #[error("no reachable node")]
    NoReachableNode,

    #[error("no responsible nodes for {0}")]
    NoResponsibleNodes(String),

    #[error("unable to connect to any responsible node for {0}")]
    Unreachable(String),
}

impl CoordinatorError {
    /// Get a static error code string for log labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSeeds => "no_seeds",
            Self::NoReachableNode => "no_reachable_node",
            Self::NoResponsibleNodes(_) => "no_responsible_nodes",
            Self::Unreachable(_) => "unreachable",
        }
    }
}
