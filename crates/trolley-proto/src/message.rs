//! Protobuf message definitions.
//!
//! The field tags are a contract with the cluster nodes. Never renumber an
//! existing field; add new fields under fresh tags so older peers skip them.

use std::collections::HashMap;

/// One entry of a shopping list as the cluster stores it.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ShoppingListItem {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(int32, tag = "3")]
    pub total_quantity: i32,
    #[prost(int32, tag = "4")]
    pub acquired_quantity: i32,
}

/// A shopping list snapshot.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ShoppingList {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, repeated, tag = "3")]
    pub items: Vec<ShoppingListItem>,
}

/// Any storable entity.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Entity {
    #[prost(oneof = "entity::Payload", tags = "1, 2")]
    pub payload: Option<entity::Payload>,
}

/// Nested types for [`Entity`].
pub mod entity {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "1")]
        ShoppingList(super::ShoppingList),
        #[prost(message, tag = "2")]
        ShoppingListItem(super::ShoppingListItem),
    }
}

/// Authoritative ring membership: token position to node identifier.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RingView {
    #[prost(map = "uint64, string", tag = "1")]
    pub token_to_node: HashMap<u64, String>,
}

/// Ask a node for its current ring view.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct FetchRing {}

/// Start receiving pushed updates for a list.
#[derive(Clone, PartialEq, prost::Message)]
pub struct SubscribeShoppingList {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// Stop receiving pushed updates for a list.
#[derive(Clone, PartialEq, prost::Message)]
pub struct UnsubscribeShoppingList {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// Read a single list.
#[derive(Clone, PartialEq, prost::Message)]
pub struct GetShoppingList {
    #[prost(string, tag = "1")]
    pub id: String,
}

/// Client to node envelope. Exactly one request kind is set.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ClientRequest {
    /// Correlation id echoed back in every [`ServerResponse`] for this request.
    #[prost(string, tag = "1")]
    pub message_id: String,
    #[prost(oneof = "client_request::Request", tags = "2, 3, 4, 5")]
    pub request: Option<client_request::Request>,
}

/// Nested types for [`ClientRequest`].
pub mod client_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Request {
        #[prost(message, tag = "2")]
        FetchRing(super::FetchRing),
        #[prost(message, tag = "3")]
        SubscribeShoppingList(super::SubscribeShoppingList),
        #[prost(message, tag = "4")]
        UnsubscribeShoppingList(super::UnsubscribeShoppingList),
        #[prost(message, tag = "5")]
        GetShoppingList(super::GetShoppingList),
    }
}

/// Node to client envelope.
#[derive(Clone, PartialEq, prost::Message)]
pub struct ServerResponse {
    #[prost(string, tag = "1")]
    pub message_id: String,
    #[prost(bool, tag = "2")]
    pub ok: bool,
    #[prost(string, tag = "3")]
    pub error: String,
    #[prost(oneof = "server_response::Payload", tags = "4, 5")]
    pub payload: Option<server_response::Payload>,
}

/// Nested types for [`ServerResponse`].
pub mod server_response {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Payload {
        #[prost(message, tag = "4")]
        RingView(super::RingView),
        #[prost(message, tag = "5")]
        Entity(super::Entity),
    }
}
