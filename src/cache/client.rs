//! Query client: cached, coalesced reads over the actor seam.
//!
//! Every read goes through [`QueryClient::fetch_resource`]: serve fresh
//! entries without a remote call, coalesce concurrent fetches behind the
//! slot's fetch gate, and keep the last good value visible across failures.
//! Invalidation marks entries stale and refetches immediately only when the
//! resource has live subscribers; otherwise the refetch is deferred to the
//! next read.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::backend::{ActorError, ActorHandle, StoreActor};
use crate::domain::entities::{ChatMessage, Order, UserProfile, Watch};

use super::config::CacheConfig;
use super::entry::{CacheEntry, FetchStatus};
use super::keys::ResourceKey;
use super::slot::ResourceSlot;
use super::store::QueryStore;

/// Cached query façade over the backend actor.
///
/// Cheap to clone; clones share the same store and connection handle.
#[derive(Clone)]
pub struct QueryClient {
    config: CacheConfig,
    handle: ActorHandle,
    store: Arc<QueryStore>,
}

impl QueryClient {
    pub fn new(config: CacheConfig, handle: ActorHandle) -> Self {
        Self {
            config,
            handle,
            store: Arc::new(QueryStore::new()),
        }
    }

    pub fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    // ========================================================================
    // Typed queries
    // ========================================================================

    pub async fn watches(&self) -> CacheEntry<Vec<Watch>> {
        self.fetch_resource(ResourceKey::Watches, &self.store.watches, Vec::new, |actor| async move {
            actor.get_watches().await
        })
        .await
    }

    pub async fn orders(&self) -> CacheEntry<Vec<Order>> {
        self.fetch_resource(ResourceKey::Orders, &self.store.orders, Vec::new, |actor| async move {
            actor.get_orders().await
        })
        .await
    }

    pub async fn messages(&self) -> CacheEntry<Vec<ChatMessage>> {
        self.fetch_resource(
            ResourceKey::Messages,
            &self.store.messages,
            Vec::new,
            |actor| async move { actor.get_all_messages().await },
        )
        .await
    }

    pub async fn is_admin(&self) -> CacheEntry<bool> {
        self.fetch_resource(
            ResourceKey::IsAdmin,
            &self.store.is_admin,
            || false,
            |actor| async move { actor.is_caller_admin().await },
        )
        .await
    }

    pub async fn caller_profile(&self) -> CacheEntry<Option<UserProfile>> {
        self.fetch_resource(
            ResourceKey::CallerProfile,
            &self.store.caller_profile,
            || None,
            |actor| async move { actor.get_caller_profile().await },
        )
        .await
    }

    // ========================================================================
    // Synchronous snapshots
    // ========================================================================

    pub fn peek_watches(&self) -> CacheEntry<Vec<Watch>> {
        self.store.watches.snapshot()
    }

    pub fn peek_orders(&self) -> CacheEntry<Vec<Order>> {
        self.store.orders.snapshot()
    }

    pub fn peek_messages(&self) -> CacheEntry<Vec<ChatMessage>> {
        self.store.messages.snapshot()
    }

    pub fn peek_is_admin(&self) -> CacheEntry<bool> {
        self.store.is_admin.snapshot()
    }

    pub fn peek_caller_profile(&self) -> CacheEntry<Option<UserProfile>> {
        self.store.caller_profile.snapshot()
    }

    // ========================================================================
    // Invalidation and subscriptions
    // ========================================================================

    /// Mark the resource stale. Refetches immediately when the resource has
    /// live subscribers and the actor is connected; defers otherwise. The
    /// immediate refetch needs an ambient tokio runtime; without one the
    /// refetch is deferred to the next read.
    pub fn invalidate(&self, key: ResourceKey) {
        self.store.mark_stale(key);
        let subscribers = self.store.subscriber_count(key);
        debug!(resource = key.as_str(), subscribers, "invalidated");
        if subscribers > 0 && self.handle.is_ready() {
            self.spawn_refresh(key);
        }
    }

    /// Register interest in a resource; kicks off a background fetch when the
    /// entry is not already fresh. As with [`QueryClient::invalidate`], the
    /// background fetch needs an ambient tokio runtime.
    pub fn subscribe(&self, key: ResourceKey) {
        self.store.add_subscriber(key);
        if !self.store.is_fresh(key) && self.handle.is_ready() {
            self.spawn_refresh(key);
        }
    }

    fn spawn_refresh(&self, key: ResourceKey) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!(resource = key.as_str(), "no runtime, refetch deferred");
            return;
        };
        let client = self.clone();
        runtime.spawn(async move {
            client.refresh(key).await;
        });
    }

    pub fn unsubscribe(&self, key: ResourceKey) {
        self.store.remove_subscriber(key);
    }

    /// Force the resource through the regular fetch path.
    pub async fn refresh(&self, key: ResourceKey) {
        match key {
            ResourceKey::Watches => {
                self.watches().await;
            }
            ResourceKey::Orders => {
                self.orders().await;
            }
            ResourceKey::Messages => {
                self.messages().await;
            }
            ResourceKey::IsAdmin => {
                self.is_admin().await;
            }
            ResourceKey::CallerProfile => {
                self.caller_profile().await;
            }
        }
    }

    // ========================================================================
    // Fetch machinery
    // ========================================================================

    /// The single read path every typed query funnels through.
    ///
    /// Without a connected actor the query resolves to its default and
    /// nothing is cached. With the cache disabled every call fetches
    /// directly. Otherwise: fresh hit, coalesced wait, or an owned fetch
    /// whose completion is guarded by the slot's ticket.
    async fn fetch_resource<T, D, F, Fut>(
        &self,
        key: ResourceKey,
        slot: &ResourceSlot<T>,
        default: D,
        fetch: F,
    ) -> CacheEntry<T>
    where
        T: Clone,
        D: FnOnce() -> T,
        F: FnOnce(Arc<dyn StoreActor>) -> Fut,
        Fut: Future<Output = Result<T, ActorError>>,
    {
        let Some(actor) = self.handle.actor() else {
            debug!(resource = key.as_str(), "actor not ready, resolving default");
            return CacheEntry::resolved_default(default());
        };

        if !self.config.enabled {
            return match fetch(actor).await {
                Ok(value) => CacheEntry {
                    value: Some(value),
                    status: FetchStatus::Ready,
                    last_fetched_at: Some(OffsetDateTime::now_utc()),
                    stale: false,
                },
                Err(error) => {
                    warn!(resource = key.as_str(), %error, "uncached fetch failed");
                    counter!("vetrina_query_error_total", "resource" => key.as_str()).increment(1);
                    CacheEntry {
                        value: None,
                        status: FetchStatus::Error,
                        last_fetched_at: None,
                        stale: false,
                    }
                }
            };
        }

        let entry = slot.snapshot();
        if entry.is_fresh() {
            counter!("vetrina_query_hit_total", "resource" => key.as_str()).increment(1);
            return entry;
        }

        let queued_mark = slot.resolution_mark();
        let _gate = slot.acquire_gate().await;

        // Whoever held the gate before us may have already fetched. A moved
        // resolution mark means the fetch we queued behind resolved while we
        // waited; its outcome (fresh value or failure) is our outcome too, so
        // a failed fetch is shared rather than retried by every waiter.
        let entry = slot.snapshot();
        if entry.is_fresh() || slot.resolution_mark() != queued_mark {
            counter!("vetrina_query_coalesced_total", "resource" => key.as_str()).increment(1);
            return entry;
        }

        counter!("vetrina_query_miss_total", "resource" => key.as_str()).increment(1);
        let ticket = slot.begin_fetch();
        match fetch(actor).await {
            Ok(value) => {
                if !slot.complete_fetch(ticket, value) {
                    counter!("vetrina_query_stale_drop_total", "resource" => key.as_str())
                        .increment(1);
                }
            }
            Err(error) => {
                warn!(resource = key.as_str(), %error, "fetch failed");
                counter!("vetrina_query_error_total", "resource" => key.as_str()).increment(1);
                slot.fail_fetch(ticket);
            }
        }
        slot.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryActor;
    use crate::domain::price::Price;

    #[tokio::test]
    async fn not_ready_resolves_default_without_caching() {
        let client = QueryClient::new(CacheConfig::default(), ActorHandle::new());
        let entry = client.watches().await;
        assert_eq!(entry.status, FetchStatus::Idle);
        assert_eq!(entry.value, Some(Vec::new()));

        // Nothing was stored.
        assert!(client.peek_watches().value.is_none());
    }

    #[tokio::test]
    async fn fresh_hit_skips_the_actor() {
        let actor = Arc::new(MemoryActor::new());
        actor.seed_watch("Calatrava", Price::from_minor_units(10_000));
        let client = QueryClient::new(
            CacheConfig::default(),
            ActorHandle::connected(actor.clone()),
        );

        let first = client.watches().await;
        assert!(first.is_fresh());
        let second = client.watches().await;
        assert!(second.is_fresh());
        assert_eq!(actor.calls("get_watches"), 1);
    }

    #[tokio::test]
    async fn invalidation_without_subscribers_defers_the_refetch() {
        let actor = Arc::new(MemoryActor::new());
        let client = QueryClient::new(
            CacheConfig::default(),
            ActorHandle::connected(actor.clone()),
        );

        client.watches().await;
        client.invalidate(ResourceKey::Watches);
        assert_eq!(actor.calls("get_watches"), 1);
        assert!(client.peek_watches().stale);

        let entry = client.watches().await;
        assert!(entry.is_fresh());
        assert_eq!(actor.calls("get_watches"), 2);
    }

    #[tokio::test]
    async fn disabled_cache_fetches_every_time() {
        let actor = Arc::new(MemoryActor::new());
        let client = QueryClient::new(
            CacheConfig::disabled(),
            ActorHandle::connected(actor.clone()),
        );

        client.watches().await;
        client.watches().await;
        assert_eq!(actor.calls("get_watches"), 2);
        assert!(client.peek_watches().value.is_none());
    }
}
