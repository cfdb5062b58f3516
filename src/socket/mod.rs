//! Protocol sockets: correlated request/response over one duplex connection.
//!
//! [`ProtocolSocket`] is either the [`NullSocket`] placeholder, which fails
//! every operation with [`SocketError::NotConnected`], or a [`LiveSocket`]
//! speaking WebSocket binary frames to one node.

mod live;
mod null;

pub use live::LiveSocket;
pub use null::NullSocket;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use trolley_proto::{ClientRequest, ServerResponse};

use crate::error::SocketError;

/// Connection lifecycle.
///
/// `Disconnected -> Connecting -> Connected -> Closed`, or
/// `Connecting -> Closed` when the handshake fails or times out. `Closed` is
/// terminal; reconnecting means creating a new socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a response handler wants after seeing one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseAction<T> {
    /// Retire the request and yield `T` from `send`.
    Done(T),
    /// Keep the request open for further responses.
    Continue,
}

/// The socket a coordinator hands out.
#[derive(Debug, Clone)]
pub enum ProtocolSocket {
    Null(NullSocket),
    Live(LiveSocket),
}

impl Default for ProtocolSocket {
    fn default() -> Self {
        Self::Null(NullSocket)
    }
}

impl ProtocolSocket {
    pub fn is_connected(&self) -> bool {
        match self {
            Self::Null(socket) => socket.is_connected(),
            Self::Live(socket) => socket.is_connected(),
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Null(socket) => socket.url(),
            Self::Live(socket) => Some(socket.url()),
        }
    }

    pub fn state(&self) -> ConnectionState {
        match self {
            Self::Null(socket) => socket.state(),
            Self::Live(socket) => socket.state(),
        }
    }

    /// Perform the handshake, bounded by `timeout`.
    pub async fn connect(&self, timeout: Duration) -> Result<(), SocketError> {
        match self {
            Self::Null(socket) => socket.connect(timeout).await,
            Self::Live(socket) => socket.connect(timeout).await,
        }
    }

    /// Send `request` and feed every correlated response to `on_response`
    /// until it returns [`ResponseAction::Done`] or an error.
    pub async fn send<T, F, Fut>(&self, request: ClientRequest, on_response: F) -> Result<T, SocketError>
    where
        F: FnMut(ServerResponse) -> Fut,
        Fut: Future<Output = Result<ResponseAction<T>, SocketError>>,
    {
        match self {
            Self::Null(socket) => socket.send(request, on_response).await,
            Self::Live(socket) => socket.send(request, on_response).await,
        }
    }

    /// Send `request` and return its first response.
    pub async fn request(&self, request: ClientRequest) -> Result<ServerResponse, SocketError> {
        self.send(request, |response| async move { Ok(ResponseAction::Done(response)) })
            .await
    }

    pub fn close(&self) {
        match self {
            Self::Null(socket) => socket.close(),
            Self::Live(socket) => socket.close(),
        }
    }
}

impl From<LiveSocket> for ProtocolSocket {
    fn from(socket: LiveSocket) -> Self {
        Self::Live(socket)
    }
}
