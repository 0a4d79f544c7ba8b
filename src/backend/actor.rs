//! The remote actor seam.
//!
//! Everything the front-end knows about persistence goes through
//! [`StoreActor`]: given inputs it returns a result or fails. The rest of the
//! crate holds an [`ActorHandle`] so the connection can appear, disappear, or
//! be swapped for a fake in tests.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::blob::ExternalBlob;
use crate::domain::entities::{
    ChatMessage, MessageId, Order, OrderId, UserProfile, Watch, WatchId,
};
use crate::domain::price::Price;
use crate::domain::types::OrderStatus;

use crate::util::lock::{rw_read, rw_write};

const SOURCE: &str = "backend::actor";

#[derive(Debug, Error)]
pub enum ActorError {
    #[error("backend actor is not connected")]
    NotConnected,
    #[error("backend rejected the call: {0}")]
    Rejected(String),
    #[error("remote call failed: {0}")]
    Transport(String),
}

impl ActorError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }
}

/// RPC surface of the storefront backend.
#[async_trait]
pub trait StoreActor: Send + Sync {
    // Catalog
    async fn get_watches(&self) -> Result<Vec<Watch>, ActorError>;
    async fn get_watch_by_id(&self, id: WatchId) -> Result<Watch, ActorError>;
    async fn add_watch(
        &self,
        name: String,
        description: String,
        price: Price,
        image: ExternalBlob,
    ) -> Result<WatchId, ActorError>;
    async fn update_watch(
        &self,
        id: WatchId,
        name: String,
        description: String,
        price: Price,
        published: bool,
    ) -> Result<(), ActorError>;
    async fn delete_watch(&self, id: WatchId) -> Result<(), ActorError>;

    // Orders
    async fn get_orders(&self) -> Result<Vec<Order>, ActorError>;
    async fn place_order(
        &self,
        customer_name: String,
        contact_info: String,
        watch_id: WatchId,
        note: String,
    ) -> Result<OrderId, ActorError>;
    async fn update_order_status(&self, id: OrderId, status: OrderStatus)
    -> Result<(), ActorError>;

    // Chat
    async fn get_all_messages(&self) -> Result<Vec<ChatMessage>, ActorError>;
    async fn send_message(
        &self,
        sender_name: String,
        text: String,
        image: Option<ExternalBlob>,
    ) -> Result<MessageId, ActorError>;
    async fn reply_to_message(
        &self,
        message_id: MessageId,
        reply_text: String,
    ) -> Result<MessageId, ActorError>;

    // Caller identity
    async fn is_caller_admin(&self) -> Result<bool, ActorError>;
    async fn get_caller_profile(&self) -> Result<Option<UserProfile>, ActorError>;
    async fn save_caller_profile(&self, profile: UserProfile) -> Result<(), ActorError>;
}

/// Shared, swappable slot holding the current actor connection.
///
/// Queries treat an empty handle as the not-ready precondition and resolve to
/// defaults; mutations fail fast with [`ActorError::NotConnected`].
#[derive(Clone, Default)]
pub struct ActorHandle {
    inner: Arc<RwLock<Option<Arc<dyn StoreActor>>>>,
}

impl ActorHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a handle that is already connected.
    pub fn connected(actor: Arc<dyn StoreActor>) -> Self {
        let handle = Self::new();
        handle.connect(actor);
        handle
    }

    pub fn connect(&self, actor: Arc<dyn StoreActor>) {
        *rw_write(&self.inner, SOURCE, "connect") = Some(actor);
    }

    pub fn disconnect(&self) {
        *rw_write(&self.inner, SOURCE, "disconnect") = None;
    }

    pub fn is_ready(&self) -> bool {
        rw_read(&self.inner, SOURCE, "is_ready").is_some()
    }

    /// The current actor, if connected.
    pub fn actor(&self) -> Option<Arc<dyn StoreActor>> {
        rw_read(&self.inner, SOURCE, "actor").clone()
    }

    /// The current actor, or [`ActorError::NotConnected`].
    pub fn require(&self) -> Result<Arc<dyn StoreActor>, ActorError> {
        self.actor().ok_or(ActorError::NotConnected)
    }
}
