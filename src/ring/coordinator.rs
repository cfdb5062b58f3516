//! Ring coordinator: membership cache and connection selection.
//!
//! The coordinator owns the current [`RingView`] and at most one live
//! [`ProtocolSocket`]. Every operation that needs a node walks a candidate
//! list (shuffled known nodes, or a key's preference list) and degrades to
//! the next candidate on failure; only exhaustion is reported.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};
use trolley_proto::ClientRequest;

use super::address::node_url;
use super::view::{RingView, hash_key, item_key};
use crate::config::{Config, CoordinatorConfig};
use crate::error::{CoordinatorError, SocketError};
use crate::socket::{LiveSocket, ProtocolSocket, ResponseAction};
use crate::telemetry::spans;

/// Outcome of a membership refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipRefresh {
    /// The ring was replaced by the node's view.
    Updated { tokens: usize, nodes: usize },
    /// The refresh failed and the previous ring is still in use.
    Retained,
}

/// Client-side view of the cluster.
#[derive(Debug)]
pub struct RingCoordinator {
    config: CoordinatorConfig,
    ring: RingView,
    socket: ProtocolSocket,
}

impl RingCoordinator {
    /// Create a coordinator whose ring spaces `seeds` evenly over the hash
    /// space until the first successful refresh.
    pub fn new(seeds: Vec<String>, config: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        if seeds.is_empty() {
            return Err(CoordinatorError::NoSeeds);
        }
        let ring = RingView::bootstrap(&seeds, config.hash_space_size);
        debug!(seeds = seeds.len(), tokens = ring.tokens().len(), "bootstrap ring built");
        Ok(Self {
            config,
            ring,
            socket: ProtocolSocket::default(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, CoordinatorError> {
        Self::new(config.seeds.clone(), config.coordinator.clone())
    }

    /// [`new`](Self::new) followed by one best-effort membership refresh.
    pub async fn bootstrap(
        seeds: Vec<String>,
        config: CoordinatorConfig,
    ) -> Result<Self, CoordinatorError> {
        let mut coordinator = Self::new(seeds, config)?;
        coordinator.refresh_membership().await;
        Ok(coordinator)
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn ring(&self) -> &RingView {
        &self.ring
    }

    /// Distinct node ids of the current ring.
    pub fn known_nodes(&self) -> &[String] {
        self.ring.nodes()
    }

    /// The cached socket, which may be the null placeholder.
    pub fn socket(&self) -> &ProtocolSocket {
        &self.socket
    }

    /// Namespaced key of `item_id`.
    pub fn item_key(&self, item_id: &str) -> String {
        item_key(&self.config.key_prefix, item_id)
    }

    /// Ring position of `item_id`.
    pub fn key_for(&self, item_id: &str) -> u64 {
        hash_key(&self.item_key(item_id), self.config.hash_space_size)
    }

    /// Nodes responsible for `item_id`, in the order they should be tried.
    pub fn preference_list(&self, item_id: &str) -> Vec<String> {
        self.ring
            .preference_list_for_key(self.key_for(item_id), self.config.preference_list_size)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    /// Replace the ring with the membership reported by a reachable node.
    ///
    /// Never fails: on any error the previous ring is kept and the reason is
    /// logged.
    pub async fn refresh_membership(&mut self) -> MembershipRefresh {
        async {
            let socket = match self.select_socket().await {
                Ok(socket) => socket,
                Err(e) => {
                    warn!(error = %e, code = e.error_code(), "membership refresh skipped");
                    return MembershipRefresh::Retained;
                }
            };

            let fetch = socket.send(ClientRequest::fetch_ring(), |response| async move {
                if !response.ok {
                    return Err(SocketError::Rejected(response.error));
                }
                response
                    .into_ring_view()
                    .map(ResponseAction::Done)
                    .ok_or(SocketError::UnexpectedResponse("ring_view"))
            });
            let view = match tokio::time::timeout(self.config.request_timeout(), fetch).await {
                Ok(Ok(view)) => view,
                Ok(Err(e)) => {
                    warn!(url = ?socket.url(), error = %e, code = e.error_code(), "membership refresh failed");
                    return MembershipRefresh::Retained;
                }
                Err(_) => {
                    warn!(
                        url = ?socket.url(),
                        timeout_ms = self.config.request_timeout_ms,
                        "membership refresh timed out"
                    );
                    return MembershipRefresh::Retained;
                }
            };

            if view.token_to_node.is_empty() {
                warn!(url = ?socket.url(), "node reported an empty ring, keeping previous view");
                return MembershipRefresh::Retained;
            }

            self.ring = RingView::from_token_map(view.token_to_node);
            let (tokens, nodes) = (self.ring.tokens().len(), self.ring.nodes().len());
            info!(tokens, nodes, "ring membership updated");
            MembershipRefresh::Updated { tokens, nodes }
        }
        .instrument(spans::refresh())
        .await
    }

    /// The cached socket if it is connected, otherwise the first known node
    /// that accepts a connection, tried in random order.
    pub async fn select_socket(&mut self) -> Result<ProtocolSocket, CoordinatorError> {
        if self.socket.is_connected() {
            return Ok(self.socket.clone());
        }

        let mut candidates = self.known_nodes().to_vec();
        candidates.shuffle(&mut rand::thread_rng());
        for node in &candidates {
            if let Some(socket) = self.try_node(node).await {
                return Ok(socket);
            }
        }
        Err(CoordinatorError::NoReachableNode)
    }

    /// A connected socket to the first reachable node of `item_id`'s
    /// preference list.
    pub async fn best_socket_for_list(
        &mut self,
        item_id: &str,
    ) -> Result<ProtocolSocket, CoordinatorError> {
        let preference = self.preference_list(item_id);
        if preference.is_empty() {
            return Err(CoordinatorError::NoResponsibleNodes(item_id.to_string()));
        }
        for node in &preference {
            if let Some(socket) = self.try_node(node).await {
                debug!(list = %item_id, node = %node, "responsible node selected");
                return Ok(socket);
            }
        }
        Err(CoordinatorError::Unreachable(item_id.to_string()))
    }

    /// Connect to `url`, reusing the cached socket when it already points
    /// there and closing it otherwise.
    pub async fn connect_socket(&mut self, url: &str) -> Result<ProtocolSocket, SocketError> {
        if self.socket.is_connected() && self.socket.url() == Some(url) {
            return Ok(self.socket.clone());
        }

        if let Some(previous) = self.socket.url() {
            debug!(from = %previous, to = %url, "replacing connection");
        }
        self.socket.close();
        self.socket = ProtocolSocket::default();

        let live = LiveSocket::new(url);
        live.connect(self.config.connect_timeout()).await?;
        self.socket = live.into();
        Ok(self.socket.clone())
    }

    /// Drop the cached connection.
    pub fn close(&mut self) {
        self.socket.close();
        self.socket = ProtocolSocket::default();
    }

    async fn try_node(&mut self, node: &str) -> Option<ProtocolSocket> {
        let url = match node_url(node, self.config.port_offset, &self.config.socket_path) {
            Ok(url) => url,
            Err(e) => {
                warn!(node = %node, error = %e, "skipping node with unusable address");
                return None;
            }
        };
        match self.connect_socket(&url).await {
            Ok(socket) => Some(socket),
            Err(e) => {
                warn!(node = %node, url = %url, error = %e, code = e.error_code(), "node unreachable");
                None
            }
        }
    }
}

/// Refresh membership every `interval` in a background task.
///
/// Returns `None` for a zero interval. The first refresh happens one interval
/// after the call; the task runs until aborted.
pub fn spawn_membership_refresh(
    coordinator: Arc<Mutex<RingCoordinator>>,
    interval: Duration,
) -> Option<JoinHandle<()>> {
    if interval.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let outcome = coordinator.lock().await.refresh_membership().await;
            debug!(?outcome, "periodic membership refresh");
        }
    }))
}
