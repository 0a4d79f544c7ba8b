//! Catalog, order, and chat records as returned by the backend actor.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::blob::ExternalBlob;
use super::price::Price;
use super::types::OrderStatus;

macro_rules! backend_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

backend_id!(
    /// Backend-generated identifier of a catalog watch.
    WatchId
);
backend_id!(
    /// Backend-generated identifier of an order record.
    OrderId
);
backend_id!(
    /// Backend-generated identifier of a chat message or reply.
    MessageId
);

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub id: WatchId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image: ExternalBlob,
    pub published: bool,
}

/// A customer order for one watch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    pub contact_info: String,
    pub watch_id: WatchId,
    pub note: String,
    pub status: OrderStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A chat message with its nested reply tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender_name: String,
    pub text: String,
    pub image: Option<ExternalBlob>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub replies: Vec<ChatMessage>,
}

/// Profile of the calling user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
}
