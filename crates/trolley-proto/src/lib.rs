//! # trolley-proto
//!
//! Wire messages spoken between trolley clients and shopping-list cluster
//! nodes.
//!
//! Messages are protobuf, derived with `prost` directly on the Rust types
//! (no build script). Requests travel in a [`ClientRequest`] envelope and
//! answers in a [`ServerResponse`]; both carry a `message_id` the client uses
//! to correlate answers with requests, since a node may answer out of order
//! and may send several answers (subscriptions) for one request.
//!
//! ```rust
//! use trolley_proto::{codec, ClientRequest, RingView, ServerResponse};
//!
//! let request = ClientRequest::fetch_ring();
//! let bytes = codec::encode_request(&request);
//! let on_node = codec::decode_request(&bytes).unwrap();
//!
//! let mut view = RingView::default();
//! view.token_to_node.insert(21845, "10.0.0.1:5000".to_string());
//! let answer = ServerResponse::ring_view(on_node.message_id, view);
//! let back = codec::decode_response(&codec::encode_response(&answer)).unwrap();
//! assert_eq!(back.message_id, request.message_id);
//! ```

#![deny(clippy::all)]

pub mod codec;
pub mod error;
pub mod message;
pub mod request;

pub use error::ProtoError;
pub use message::{
    client_request, entity, server_response, ClientRequest, Entity, FetchRing, GetShoppingList,
    RingView, ServerResponse, ShoppingList, ShoppingListItem, SubscribeShoppingList,
    UnsubscribeShoppingList,
};
pub use request::new_message_id;
