//! WebSocket-backed protocol socket.
//!
//! One background task owns the stream. Requests are queued to it over an
//! mpsc channel; responses are routed back to the waiting `send` call by
//! `message_id`, so any number of requests can be in flight and answers may
//! arrive in any order.

use std::fmt;
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{Instrument, debug, info, warn};
use trolley_proto::{ClientRequest, ServerResponse, codec, new_message_id};

use super::{ConnectionState, ResponseAction};
use crate::error::SocketError;
use crate::telemetry::spans;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Cheaply cloneable handle to one WebSocket connection.
#[derive(Clone)]
pub struct LiveSocket {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    state: Mutex<ConnectionState>,
    /// Frames for the I/O task. `None` until connected and after close.
    outbound: Mutex<Option<mpsc::UnboundedSender<Message>>>,
    /// In-flight requests keyed by correlation id.
    pending: DashMap<String, mpsc::UnboundedSender<ServerResponse>>,
}

impl LiveSocket {
    /// A socket for `url` in the `Disconnected` state.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                state: Mutex::new(ConnectionState::Disconnected),
                outbound: Mutex::new(None),
                pending: DashMap::new(),
            }),
        }
    }

    /// Create a socket for `url` and connect it.
    pub async fn open(url: impl Into<String>, timeout: Duration) -> Result<Self, SocketError> {
        let socket = Self::new(url);
        socket.connect(timeout).await?;
        Ok(socket)
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of requests still waiting for a response.
    pub fn in_flight(&self) -> usize {
        self.inner.pending.len()
    }

    /// Run the WebSocket handshake, giving up after `timeout`.
    ///
    /// On timeout the handshake future is dropped, which tears down the
    /// half-open TCP connection. Connecting an already connected socket is a
    /// no-op; a closed socket cannot be reopened.
    pub async fn connect(&self, timeout: Duration) -> Result<(), SocketError> {
        {
            let mut state = self.inner.state.lock();
            match *state {
                ConnectionState::Connected => return Ok(()),
                ConnectionState::Connecting | ConnectionState::Closed => {
                    return Err(SocketError::NotConnected);
                }
                ConnectionState::Disconnected => *state = ConnectionState::Connecting,
            }
        }

        let url = self.inner.url.clone();
        debug!(url = %url, timeout_ms = timeout.as_millis() as u64, "connecting");
        let stream = match tokio::time::timeout(timeout, connect_async(url.as_str())).await {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                self.inner.mark_closed();
                return Err(SocketError::Handshake {
                    url,
                    source: Box::new(e),
                });
            }
            Err(_) => {
                self.inner.mark_closed();
                return Err(SocketError::ConnectTimeout {
                    url,
                    timeout_ms: timeout.as_millis() as u64,
                });
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        {
            let mut state = self.inner.state.lock();
            if *state == ConnectionState::Closed {
                // Closed locally while the handshake was running.
                return Err(SocketError::NotConnected);
            }
            *state = ConnectionState::Connected;
            *self.inner.outbound.lock() = Some(tx);
        }
        info!(url = %url, "connected");

        let inner = Arc::downgrade(&self.inner);
        tokio::spawn(run_io(inner, stream, rx).instrument(spans::connection(&url)));
        Ok(())
    }

    /// Send `request` under a fresh correlation id and hand each correlated
    /// response to `on_response`.
    ///
    /// Resolves with the handler's `Done` value, the handler's error, or
    /// [`SocketError::ConnectionLost`] if the socket closes first.
    pub async fn send<T, F, Fut>(
        &self,
        mut request: ClientRequest,
        on_response: F,
    ) -> Result<T, SocketError>
    where
        F: FnMut(ServerResponse) -> Fut,
        Fut: Future<Output = Result<ResponseAction<T>, SocketError>>,
    {
        request.message_id = new_message_id();
        let span = spans::request(request.kind(), &request.message_id);
        self.exchange(request, on_response).instrument(span).await
    }

    async fn exchange<T, F, Fut>(
        &self,
        request: ClientRequest,
        mut on_response: F,
    ) -> Result<T, SocketError>
    where
        F: FnMut(ServerResponse) -> Fut,
        Fut: Future<Output = Result<ResponseAction<T>, SocketError>>,
    {
        // Register before looking at the outbound channel: a close racing
        // with us either hides the channel or drops this waiter.
        let (waiter, mut responses) = mpsc::unbounded_channel();
        let _registration = Registration::new(&self.inner.pending, &request.message_id, waiter);

        let outbound = self
            .inner
            .outbound
            .lock()
            .clone()
            .ok_or(SocketError::NotConnected)?;
        let frame = Message::Binary(codec::encode_request(&request));
        let queued = outbound.send(frame);
        // The I/O task stops once every sender is gone; do not hold one
        // while waiting.
        drop(outbound);
        queued.map_err(|_| SocketError::ConnectionLost)?;
        debug!("request sent");

        while let Some(response) = responses.recv().await {
            match on_response(response).await? {
                ResponseAction::Done(value) => return Ok(value),
                ResponseAction::Continue => {}
            }
        }
        Err(SocketError::ConnectionLost)
    }

    /// Close the connection and fail every in-flight request.
    pub fn close(&self) {
        if self.state() != ConnectionState::Closed {
            info!(url = %self.inner.url, "closing connection");
            self.inner.mark_closed();
        }
    }
}

impl fmt::Debug for LiveSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveSocket")
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Inner {
    /// Terminal transition. Dropping the outbound sender stops the I/O task;
    /// clearing `pending` drops every waiter's sender.
    fn mark_closed(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), ConnectionState::Closed);
        self.outbound.lock().take();
        let abandoned = self.pending.len();
        self.pending.clear();
        if previous != ConnectionState::Closed {
            debug!(url = %self.url, from = %previous, abandoned, "socket closed");
        }
    }

    fn dispatch(&self, bytes: &[u8]) {
        let response = match codec::decode_response(bytes) {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "dropping undecodable frame");
                return;
            }
        };
        match self.pending.get(&response.message_id) {
            Some(waiter) => {
                // A send error means the caller is already gone.
                let _ = waiter.send(response);
            }
            None => {
                debug!(message_id = %response.message_id, "dropping response for unknown request");
            }
        }
    }
}

/// Removes a pending waiter when its `send` finishes or is dropped.
struct Registration<'a> {
    pending: &'a DashMap<String, mpsc::UnboundedSender<ServerResponse>>,
    message_id: String,
}

impl<'a> Registration<'a> {
    fn new(
        pending: &'a DashMap<String, mpsc::UnboundedSender<ServerResponse>>,
        message_id: &str,
        waiter: mpsc::UnboundedSender<ServerResponse>,
    ) -> Self {
        pending.insert(message_id.to_string(), waiter);
        Self {
            pending,
            message_id: message_id.to_string(),
        }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.message_id);
    }
}

/// Owns the stream until either side closes. Holds the socket weakly so that
/// dropping every handle closes the connection.
async fn run_io(
    inner: Weak<Inner>,
    stream: WsStream,
    mut outbound: mpsc::UnboundedReceiver<Message>,
) {
    let (mut sink, mut source) = stream.split();
    loop {
        tokio::select! {
            frame = outbound.recv() => {
                match frame {
                    Some(frame) => {
                        if let Err(e) = sink.send(frame).await {
                            warn!(error = %e, "write failed, closing connection");
                            break;
                        }
                    }
                    None => {
                        // Local close.
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                }
            }
            incoming = source.next() => {
                match incoming {
                    Some(Ok(Message::Binary(bytes))) => match inner.upgrade() {
                        Some(inner) => inner.dispatch(&bytes),
                        None => break,
                    },
                    Some(Ok(Message::Close(frame))) => {
                        info!(?frame, "remote closed connection");
                        break;
                    }
                    // Pings are answered by tungstenite; text frames are not part
                    // of the protocol.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "read failed, closing connection");
                        break;
                    }
                    None => break,
                }
            }
        }
    }
    if let Some(inner) = inner.upgrade() {
        inner.mark_closed();
    }
}
