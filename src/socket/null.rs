//! Placeholder socket used before the first connection.

use std::future::Future;
use std::time::Duration;

use trolley_proto::{ClientRequest, ServerResponse};

use super::{ConnectionState, ResponseAction};
use crate::error::SocketError;

/// A socket that is never connected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSocket;

impl NullSocket {
    pub fn is_connected(&self) -> bool {
        false
    }

    pub fn url(&self) -> Option<&str> {
        None
    }

    pub fn state(&self) -> ConnectionState {
        ConnectionState::Disconnected
    }

    pub async fn connect(&self, _timeout: Duration) -> Result<(), SocketError> {
        Err(SocketError::NotConnected)
    }

    pub async fn send<T, F, Fut>(&self, _request: ClientRequest, _on_response: F) -> Result<T, SocketError>
    where
        F: FnMut(ServerResponse) -> Fut,
        Fut: Future<Output = Result<ResponseAction<T>, SocketError>>,
    {
        Err(SocketError::NotConnected)
    }

    pub fn close(&self) {}
}
