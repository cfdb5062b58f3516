//! Convenience constructors and accessors for the request/response envelopes.

use uuid::Uuid;

use crate::message::{
    client_request::Request, entity, server_response::Payload, ClientRequest, Entity, FetchRing,
    GetShoppingList, RingView, ServerResponse, ShoppingList, SubscribeShoppingList,
    UnsubscribeShoppingList,
};

/// Generate a fresh correlation id.
pub fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl ClientRequest {
    fn with_request(request: Request) -> Self {
        Self {
            message_id: new_message_id(),
            request: Some(request),
        }
    }

    /// Describe-ring request. Carries no payload fields.
    ///
    /// # Example
    ///
    /// ```rust
    /// use trolley_proto::ClientRequest;
    ///
    /// let req = ClientRequest::fetch_ring();
    /// assert_eq!(req.kind(), "fetch_ring");
    /// assert!(!req.message_id.is_empty());
    /// ```
    pub fn fetch_ring() -> Self {
        Self::with_request(Request::FetchRing(FetchRing {}))
    }

    /// Subscribe to pushed updates of `list_id`.
    pub fn subscribe(list_id: impl Into<String>) -> Self {
        Self::with_request(Request::SubscribeShoppingList(SubscribeShoppingList {
            id: list_id.into(),
        }))
    }

    /// Cancel a subscription to `list_id`.
    pub fn unsubscribe(list_id: impl Into<String>) -> Self {
        Self::with_request(Request::UnsubscribeShoppingList(UnsubscribeShoppingList {
            id: list_id.into(),
        }))
    }

    /// Read `list_id` once.
    pub fn get_shopping_list(list_id: impl Into<String>) -> Self {
        Self::with_request(Request::GetShoppingList(GetShoppingList { id: list_id.into() }))
    }

    /// Static label of the request kind, for logging.
    pub fn kind(&self) -> &'static str {
        match &self.request {
            Some(Request::FetchRing(_)) => "fetch_ring",
            Some(Request::SubscribeShoppingList(_)) => "subscribe_shopping_list",
            Some(Request::UnsubscribeShoppingList(_)) => "unsubscribe_shopping_list",
            Some(Request::GetShoppingList(_)) => "get_shopping_list",
            None => "empty",
        }
    }
}

impl ServerResponse {
    /// Successful response carrying a ring view.
    pub fn ring_view(message_id: impl Into<String>, view: RingView) -> Self {
        Self {
            message_id: message_id.into(),
            ok: true,
            error: String::new(),
            payload: Some(Payload::RingView(view)),
        }
    }

    /// Successful response carrying a shopping list.
    pub fn shopping_list(message_id: impl Into<String>, list: ShoppingList) -> Self {
        Self {
            message_id: message_id.into(),
            ok: true,
            error: String::new(),
            payload: Some(Payload::Entity(Entity {
                payload: Some(entity::Payload::ShoppingList(list)),
            })),
        }
    }

    /// Successful response with no payload.
    pub fn ack(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ok: true,
            error: String::new(),
            payload: None,
        }
    }

    /// Failed response with a reason.
    pub fn failure(message_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            ok: false,
            error: error.into(),
            payload: None,
        }
    }

    /// The ring view payload, if that is what this response carries.
    pub fn as_ring_view(&self) -> Option<&RingView> {
        match &self.payload {
            Some(Payload::RingView(view)) => Some(view),
            _ => None,
        }
    }

    /// The shopping list payload, if that is what this response carries.
    pub fn as_shopping_list(&self) -> Option<&ShoppingList> {
        match &self.payload {
            Some(Payload::Entity(Entity {
                payload: Some(entity::Payload::ShoppingList(list)),
            })) => Some(list),
            _ => None,
        }
    }

    /// Consume the response, keeping only the ring view.
    pub fn into_ring_view(self) -> Option<RingView> {
        match self.payload {
            Some(Payload::RingView(view)) => Some(view),
            _ => None,
        }
    }
}
