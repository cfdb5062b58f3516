//! Consistent-hashing ring: membership view, node addressing and the
//! coordinator that turns list ids into live connections.

mod address;
mod coordinator;
mod view;

pub use address::{node_url, split_node_id};
pub use coordinator::{MembershipRefresh, RingCoordinator, spawn_membership_refresh};
pub use view::{RingView, hash_key, item_key, ring_hash};
