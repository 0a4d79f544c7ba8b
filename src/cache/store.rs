//! Query store: one typed slot per resource key.
//!
//! The store is the only shared mutable state in the crate. Every slot is
//! exclusively owned here; entries are replaced wholesale by fetch
//! completions and marked stale by invalidations, never edited in place.

use crate::domain::entities::{ChatMessage, Order, UserProfile, Watch};

use super::keys::ResourceKey;
use super::slot::ResourceSlot;

pub(crate) struct QueryStore {
    pub(crate) watches: ResourceSlot<Vec<Watch>>,
    pub(crate) orders: ResourceSlot<Vec<Order>>,
    pub(crate) messages: ResourceSlot<Vec<ChatMessage>>,
    pub(crate) is_admin: ResourceSlot<bool>,
    pub(crate) caller_profile: ResourceSlot<Option<UserProfile>>,
}

impl QueryStore {
    pub(crate) fn new() -> Self {
        Self {
            watches: ResourceSlot::new(),
            orders: ResourceSlot::new(),
            messages: ResourceSlot::new(),
            is_admin: ResourceSlot::new(),
            caller_profile: ResourceSlot::new(),
        }
    }

    pub(crate) fn mark_stale(&self, key: ResourceKey) {
        match key {
            ResourceKey::Watches => self.watches.mark_stale(),
            ResourceKey::Orders => self.orders.mark_stale(),
            ResourceKey::Messages => self.messages.mark_stale(),
            ResourceKey::IsAdmin => self.is_admin.mark_stale(),
            ResourceKey::CallerProfile => self.caller_profile.mark_stale(),
        }
    }

    pub(crate) fn add_subscriber(&self, key: ResourceKey) {
        match key {
            ResourceKey::Watches => self.watches.add_subscriber(),
            ResourceKey::Orders => self.orders.add_subscriber(),
            ResourceKey::Messages => self.messages.add_subscriber(),
            ResourceKey::IsAdmin => self.is_admin.add_subscriber(),
            ResourceKey::CallerProfile => self.caller_profile.add_subscriber(),
        }
    }

    pub(crate) fn remove_subscriber(&self, key: ResourceKey) {
        match key {
            ResourceKey::Watches => self.watches.remove_subscriber(),
            ResourceKey::Orders => self.orders.remove_subscriber(),
            ResourceKey::Messages => self.messages.remove_subscriber(),
            ResourceKey::IsAdmin => self.is_admin.remove_subscriber(),
            ResourceKey::CallerProfile => self.caller_profile.remove_subscriber(),
        }
    }

    pub(crate) fn subscriber_count(&self, key: ResourceKey) -> usize {
        match key {
            ResourceKey::Watches => self.watches.subscriber_count(),
            ResourceKey::Orders => self.orders.subscriber_count(),
            ResourceKey::Messages => self.messages.subscriber_count(),
            ResourceKey::IsAdmin => self.is_admin.subscriber_count(),
            ResourceKey::CallerProfile => self.caller_profile.subscriber_count(),
        }
    }

    /// Whether the entry for the key can be served without a fetch.
    pub(crate) fn is_fresh(&self, key: ResourceKey) -> bool {
        match key {
            ResourceKey::Watches => self.watches.snapshot().is_fresh(),
            ResourceKey::Orders => self.orders.snapshot().is_fresh(),
            ResourceKey::Messages => self.messages.snapshot().is_fresh(),
            ResourceKey::IsAdmin => self.is_admin.snapshot().is_fresh(),
            ResourceKey::CallerProfile => self.caller_profile.snapshot().is_fresh(),
        }
    }
}
