//! Scripted test node.
//!
//! Accepts WebSocket connections on an ephemeral port, decodes every binary
//! frame as a `ClientRequest` and hands it to the handler. The handler's
//! replies are written back in order.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;
use trolley::proto::{ClientRequest, ServerResponse, codec};

/// What the node does after seeing a request.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(ServerResponse),
    /// Close the connection with a close frame.
    Hangup,
}

type Handler = Arc<dyn Fn(ClientRequest) -> Vec<Reply> + Send + Sync>;

pub struct TestNode {
    addr: SocketAddr,
    received: Arc<Mutex<Vec<ClientRequest>>>,
    accepted: Arc<AtomicUsize>,
    open: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl TestNode {
    /// Start a node on 127.0.0.1 with an ephemeral port.
    pub async fn spawn<F>(handler: F) -> Self
    where
        F: Fn(ClientRequest) -> Vec<Reply> + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test node");
        let addr = listener.local_addr().expect("local addr");
        let handler: Handler = Arc::new(handler);
        let received = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let open = Arc::new(AtomicUsize::new(0));

        let task = {
            let received = Arc::clone(&received);
            let accepted = Arc::clone(&accepted);
            let open = Arc::clone(&open);
            tokio::spawn(async move {
                while let Ok((stream, _)) = listener.accept().await {
                    accepted.fetch_add(1, Ordering::SeqCst);
                    open.fetch_add(1, Ordering::SeqCst);
                    let handler = Arc::clone(&handler);
                    let received = Arc::clone(&received);
                    let open = Arc::clone(&open);
                    tokio::spawn(async move {
                        serve(stream, handler, received).await;
                        open.fetch_sub(1, Ordering::SeqCst);
                    });
                }
            })
        };

        Self {
            addr,
            received,
            accepted,
            open,
            task,
        }
    }

    /// A node that answers `fetch_ring` with `token_to_node`.
    pub async fn with_ring(token_to_node: Vec<(u64, String)>) -> Self {
        Self::spawn(move |request| {
            let view = trolley::proto::RingView {
                token_to_node: token_to_node.iter().cloned().collect(),
            };
            vec![Reply::Respond(ServerResponse::ring_view(
                request.message_id,
                view,
            ))]
        })
        .await
    }

    /// Node id as it appears in a ring (`host:port`, used with port offset 0).
    pub fn node_id(&self) -> String {
        self.addr.to_string()
    }

    pub fn url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    pub fn received(&self) -> Vec<ClientRequest> {
        self.received.lock().clone()
    }

    /// Connections accepted so far.
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Connections currently being served.
    pub fn open_connections(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl Drop for TestNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, handler: Handler, received: Arc<Mutex<Vec<ClientRequest>>>) {
    let Ok(ws) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut source) = ws.split();
    while let Some(Ok(frame)) = source.next().await {
        let bytes = match frame {
            Message::Binary(bytes) => bytes,
            Message::Close(_) => break,
            _ => continue,
        };
        let Ok(request) = codec::decode_request(&bytes) else {
            continue;
        };
        received.lock().push(request.clone());
        for reply in handler(request) {
            match reply {
                Reply::Respond(response) => {
                    let frame = Message::Binary(codec::encode_response(&response));
                    if sink.send(frame).await.is_err() {
                        return;
                    }
                }
                Reply::Hangup => {
                    let _ = sink.send(Message::Close(None)).await;
                    return;
                }
            }
        }
    }
}

/// A TCP listener that never answers the WebSocket handshake.
///
/// Connections complete at the TCP level from the kernel backlog, so a client
/// hangs waiting for the HTTP upgrade response. Keep the listener alive for
/// the duration of the test.
pub async fn silent_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind silent listener");
    let addr = listener.local_addr().expect("local addr");
    (listener, addr)
}
