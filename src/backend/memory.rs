//! In-memory backend actor.
//!
//! Backs tests and demos without a network. Beyond the plain RPC surface it
//! offers per-operation call counting, injectable failures, and optional
//! artificial latency so coalescing and failure paths can be exercised
//! deterministically.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use time::OffsetDateTime;
use tracing::debug;

use crate::domain::blob::ExternalBlob;
use crate::domain::entities::{
    ChatMessage, MessageId, Order, OrderId, UserProfile, Watch, WatchId,
};
use crate::domain::price::Price;
use crate::domain::types::OrderStatus;
use crate::util::lock::mutex_lock;

use super::actor::{ActorError, StoreActor};

const SOURCE: &str = "backend::memory";

#[derive(Default)]
struct MemoryState {
    watches: Vec<Watch>,
    orders: Vec<Order>,
    messages: Vec<ChatMessage>,
    profile: Option<UserProfile>,
    next_watch_id: u64,
    next_order_id: u64,
    next_message_id: u64,
}

/// In-memory [`StoreActor`] with test instrumentation.
#[derive(Default)]
pub struct MemoryActor {
    state: Mutex<MemoryState>,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_next: Mutex<HashSet<&'static str>>,
    latency: Mutex<Option<Duration>>,
    caller_is_admin: AtomicBool,
}

impl MemoryActor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times the named operation has been invoked.
    pub fn calls(&self, op: &str) -> usize {
        mutex_lock(&self.calls, SOURCE, "calls")
            .get(op)
            .copied()
            .unwrap_or(0)
    }

    /// Make the next invocation of the named operation fail.
    pub fn fail_next(&self, op: &'static str) {
        mutex_lock(&self.fail_next, SOURCE, "fail_next").insert(op);
    }

    /// Delay every operation by the given duration.
    pub fn set_latency(&self, latency: Duration) {
        *mutex_lock(&self.latency, SOURCE, "set_latency") = Some(latency);
    }

    pub fn clear_latency(&self) {
        *mutex_lock(&self.latency, SOURCE, "clear_latency") = None;
    }

    /// Mark the calling identity as admin for `is_caller_admin`.
    pub fn set_caller_admin(&self, is_admin: bool) {
        self.caller_is_admin.store(is_admin, Ordering::SeqCst);
    }

    /// Seed a published catalog watch, returning its id.
    pub fn seed_watch(&self, name: &str, price: Price) -> WatchId {
        let mut state = mutex_lock(&self.state, SOURCE, "seed_watch");
        state.next_watch_id += 1;
        let id = WatchId(state.next_watch_id);
        state.watches.push(Watch {
            id,
            name: name.to_string(),
            description: String::new(),
            price,
            image: ExternalBlob::from_bytes(vec![0u8; 4]),
            published: true,
        });
        id
    }

    async fn begin(&self, op: &'static str) -> Result<(), ActorError> {
        *mutex_lock(&self.calls, SOURCE, "begin.count")
            .entry(op)
            .or_insert(0) += 1;

        let latency = *mutex_lock(&self.latency, SOURCE, "begin.latency");
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if mutex_lock(&self.fail_next, SOURCE, "begin.fail").remove(op) {
            debug!(op, "injected failure");
            return Err(ActorError::transport("injected failure"));
        }
        Ok(())
    }

    fn drive_upload(image: &ExternalBlob) {
        if let Some(reporter) = image.progress_reporter() {
            reporter.report(100);
        }
    }
}

#[async_trait]
impl StoreActor for MemoryActor {
    async fn get_watches(&self) -> Result<Vec<Watch>, ActorError> {
        self.begin("get_watches").await?;
        Ok(mutex_lock(&self.state, SOURCE, "get_watches").watches.clone())
    }

    async fn get_watch_by_id(&self, id: WatchId) -> Result<Watch, ActorError> {
        self.begin("get_watch_by_id").await?;
        mutex_lock(&self.state, SOURCE, "get_watch_by_id")
            .watches
            .iter()
            .find(|watch| watch.id == id)
            .cloned()
            .ok_or_else(|| ActorError::rejected(format!("unknown watch {id}")))
    }

    async fn add_watch(
        &self,
        name: String,
        description: String,
        price: Price,
        image: ExternalBlob,
    ) -> Result<WatchId, ActorError> {
        self.begin("add_watch").await?;
        Self::drive_upload(&image);
        let mut state = mutex_lock(&self.state, SOURCE, "add_watch");
        state.next_watch_id += 1;
        let id = WatchId(state.next_watch_id);
        state.watches.push(Watch {
            id,
            name,
            description,
            price,
            image,
            published: false,
        });
        Ok(id)
    }

    async fn update_watch(
        &self,
        id: WatchId,
        name: String,
        description: String,
        price: Price,
        published: bool,
    ) -> Result<(), ActorError> {
        self.begin("update_watch").await?;
        let mut state = mutex_lock(&self.state, SOURCE, "update_watch");
        let watch = state
            .watches
            .iter_mut()
            .find(|watch| watch.id == id)
            .ok_or_else(|| ActorError::rejected(format!("unknown watch {id}")))?;
        watch.name = name;
        watch.description = description;
        watch.price = price;
        watch.published = published;
        Ok(())
    }

    async fn delete_watch(&self, id: WatchId) -> Result<(), ActorError> {
        self.begin("delete_watch").await?;
        let mut state = mutex_lock(&self.state, SOURCE, "delete_watch");
        let before = state.watches.len();
        state.watches.retain(|watch| watch.id != id);
        if state.watches.len() == before {
            return Err(ActorError::rejected(format!("unknown watch {id}")));
        }
        Ok(())
    }

    async fn get_orders(&self) -> Result<Vec<Order>, ActorError> {
        self.begin("get_orders").await?;
        Ok(mutex_lock(&self.state, SOURCE, "get_orders").orders.clone())
    }

    async fn place_order(
        &self,
        customer_name: String,
        contact_info: String,
        watch_id: WatchId,
        note: String,
    ) -> Result<OrderId, ActorError> {
        self.begin("place_order").await?;
        let mut state = mutex_lock(&self.state, SOURCE, "place_order");
        if !state.watches.iter().any(|watch| watch.id == watch_id) {
            return Err(ActorError::rejected(format!("unknown watch {watch_id}")));
        }
        state.next_order_id += 1;
        let id = OrderId(state.next_order_id);
        state.orders.push(Order {
            id,
            customer_name,
            contact_info,
            watch_id,
            note,
            status: OrderStatus::Pending,
            timestamp: OffsetDateTime::now_utc(),
        });
        Ok(id)
    }

    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), ActorError> {
        self.begin("update_order_status").await?;
        let mut state = mutex_lock(&self.state, SOURCE, "update_order_status");
        let order = state
            .orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or_else(|| ActorError::rejected(format!("unknown order {id}")))?;
        order.status = status;
        Ok(())
    }

    async fn get_all_messages(&self) -> Result<Vec<ChatMessage>, ActorError> {
        self.begin("get_all_messages").await?;
        Ok(mutex_lock(&self.state, SOURCE, "get_all_messages")
            .messages
            .clone())
    }

    async fn send_message(
        &self,
        sender_name: String,
        text: String,
        image: Option<ExternalBlob>,
    ) -> Result<MessageId, ActorError> {
        self.begin("send_message").await?;
        if let Some(image) = &image {
            Self::drive_upload(image);
        }
        let mut state = mutex_lock(&self.state, SOURCE, "send_message");
        state.next_message_id += 1;
        let id = MessageId(state.next_message_id);
        state.messages.push(ChatMessage {
            id,
            sender_name,
            text,
            image,
            timestamp: OffsetDateTime::now_utc(),
            replies: Vec::new(),
        });
        Ok(id)
    }

    async fn reply_to_message(
        &self,
        message_id: MessageId,
        reply_text: String,
    ) -> Result<MessageId, ActorError> {
        self.begin("reply_to_message").await?;
        let mut state = mutex_lock(&self.state, SOURCE, "reply_to_message");
        state.next_message_id += 1;
        let reply_id = MessageId(state.next_message_id);
        let message = state
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
            .ok_or_else(|| ActorError::rejected(format!("unknown message {message_id}")))?;
        message.replies.push(ChatMessage {
            id: reply_id,
            sender_name: "Support".to_string(),
            text: reply_text,
            image: None,
            timestamp: OffsetDateTime::now_utc(),
            replies: Vec::new(),
        });
        Ok(reply_id)
    }

    async fn is_caller_admin(&self) -> Result<bool, ActorError> {
        self.begin("is_caller_admin").await?;
        Ok(self.caller_is_admin.load(Ordering::SeqCst))
    }

    async fn get_caller_profile(&self) -> Result<Option<UserProfile>, ActorError> {
        self.begin("get_caller_profile").await?;
        Ok(mutex_lock(&self.state, SOURCE, "get_caller_profile")
            .profile
            .clone())
    }

    async fn save_caller_profile(&self, profile: UserProfile) -> Result<(), ActorError> {
        self.begin("save_caller_profile").await?;
        mutex_lock(&self.state, SOURCE, "save_caller_profile").profile = Some(profile);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_calls_per_operation() {
        let actor = MemoryActor::new();
        assert_eq!(actor.calls("get_watches"), 0);
        actor.get_watches().await.expect("first read");
        actor.get_watches().await.expect("second read");
        assert_eq!(actor.calls("get_watches"), 2);
        assert_eq!(actor.calls("get_orders"), 0);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let actor = MemoryActor::new();
        actor.fail_next("get_watches");
        assert!(actor.get_watches().await.is_err());
        assert!(actor.get_watches().await.is_ok());
    }

    #[tokio::test]
    async fn watch_crud_round_trip() {
        let actor = MemoryActor::new();
        let id = actor
            .add_watch(
                "Royal Tourbillon".to_string(),
                "".to_string(),
                Price::from_minor_units(129_900),
                ExternalBlob::from_bytes(vec![0u8; 4]),
            )
            .await
            .expect("add watch");

        actor
            .update_watch(
                id,
                "Royal Tourbillon".to_string(),
                "Hand wound.".to_string(),
                Price::from_minor_units(149_900),
                true,
            )
            .await
            .expect("update watch");

        let watch = actor.get_watch_by_id(id).await.expect("fetch watch");
        assert!(watch.published);
        assert_eq!(watch.price.minor_units(), 149_900);

        actor.delete_watch(id).await.expect("delete watch");
        assert!(actor.get_watch_by_id(id).await.is_err());
    }

    #[tokio::test]
    async fn orders_require_a_known_watch() {
        let actor = MemoryActor::new();
        let missing = actor
            .place_order(
                "James".to_string(),
                "a@b.c".to_string(),
                WatchId(99),
                "".to_string(),
            )
            .await;
        assert!(missing.is_err());

        let watch_id = actor.seed_watch("Calatrava", Price::from_minor_units(10_000));
        let order_id = actor
            .place_order(
                "James".to_string(),
                "a@b.c".to_string(),
                watch_id,
                "".to_string(),
            )
            .await
            .expect("place order");

        actor
            .update_order_status(order_id, OrderStatus::Confirmed)
            .await
            .expect("update status");
        let orders = actor.get_orders().await.expect("read orders");
        assert_eq!(orders[0].status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn replies_nest_under_their_message() {
        let actor = MemoryActor::new();
        let id = actor
            .send_message("Ada".to_string(), "Hello".to_string(), None)
            .await
            .expect("send");
        let reply_id = actor
            .reply_to_message(id, "Welcome!".to_string())
            .await
            .expect("reply");

        let messages = actor.get_all_messages().await.expect("read messages");
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].replies.len(), 1);
        assert_eq!(messages[0].replies[0].id, reply_id);

        assert!(
            actor
                .reply_to_message(MessageId(404), "nope".to_string())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn upload_progress_is_driven_to_completion() {
        use futures::StreamExt;

        use crate::domain::blob::ProgressUpdate;

        let actor = MemoryActor::new();
        let (image, progress) = ExternalBlob::from_bytes(vec![0u8; 4]).with_upload_progress();
        actor
            .add_watch(
                "Nautilus".to_string(),
                "".to_string(),
                Price::from_minor_units(1),
                image,
            )
            .await
            .expect("add watch");

        let updates: Vec<ProgressUpdate> = progress.collect().await;
        assert_eq!(updates.last(), Some(&ProgressUpdate::Percent(100)));
    }
}
