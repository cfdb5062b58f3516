//! trolley - client coordination for a sharded, replicated shopping-list store.
//!
//! - [`ring`]: consistent-hashing view of the cluster and the coordinator that
//!   turns list ids into connections to responsible nodes.
//! - [`socket`]: correlated request/response over one WebSocket connection.
//! - [`config`]: TOML configuration with validation.
//! - [`crdt`] / [`proto`]: the delta-CRDT kernel and wire messages.

pub mod config;
pub mod error;
pub mod ring;
pub mod socket;
pub mod telemetry;

pub use trolley_crdt as crdt;
pub use trolley_proto as proto;

pub use config::{Config, CoordinatorConfig};
pub use error::{AddressError, CoordinatorError, SocketError};
pub use ring::{MembershipRefresh, RingCoordinator, RingView};
pub use socket::{ConnectionState, LiveSocket, NullSocket, ProtocolSocket, ResponseAction};
