//! Mutation executor.
//!
//! Every write funnels through [`MutationExecutor::run`]: the remote call is
//! issued exactly once, and only a successful call invalidates the mutation's
//! declared resource keys. Failed calls leave the cache untouched so readers
//! keep the last good value. Racing mutations are not serialized; whichever
//! invalidation lands last wins and the final refetch reflects the backend's
//! own ordering.

use std::future::Future;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, warn};

use crate::backend::{ActorError, StoreActor};
use crate::cache::{QueryClient, ResourceKey};
use crate::domain::entities::{MessageId, OrderId, UserProfile, WatchId};
use crate::domain::forms::{
    ChatDraft, OrderDraft, ProfileDraft, ReplyDraft, WatchDraft, WatchPatch,
};
use crate::domain::types::OrderStatus;

use super::error::AppError;

/// Every write the storefront can perform, with its invalidation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    AddWatch,
    UpdateWatch,
    DeleteWatch,
    PlaceOrder,
    UpdateOrderStatus,
    SendMessage,
    ReplyToMessage,
    SaveProfile,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::AddWatch => "add_watch",
            MutationKind::UpdateWatch => "update_watch",
            MutationKind::DeleteWatch => "delete_watch",
            MutationKind::PlaceOrder => "place_order",
            MutationKind::UpdateOrderStatus => "update_order_status",
            MutationKind::SendMessage => "send_message",
            MutationKind::ReplyToMessage => "reply_to_message",
            MutationKind::SaveProfile => "save_profile",
        }
    }

    /// Resource keys stale after this mutation succeeds.
    pub fn invalidates(self) -> &'static [ResourceKey] {
        match self {
            MutationKind::AddWatch | MutationKind::UpdateWatch | MutationKind::DeleteWatch => {
                &[ResourceKey::Watches]
            }
            MutationKind::PlaceOrder | MutationKind::UpdateOrderStatus => &[ResourceKey::Orders],
            MutationKind::SendMessage | MutationKind::ReplyToMessage => &[ResourceKey::Messages],
            MutationKind::SaveProfile => &[ResourceKey::CallerProfile],
        }
    }
}

/// Issues writes against the actor and keeps the query cache honest.
#[derive(Clone)]
pub struct MutationExecutor {
    queries: QueryClient,
}

impl MutationExecutor {
    pub fn new(queries: QueryClient) -> Self {
        Self { queries }
    }

    pub fn queries(&self) -> &QueryClient {
        &self.queries
    }

    pub async fn add_watch(&self, draft: WatchDraft) -> Result<WatchId, AppError> {
        self.run(MutationKind::AddWatch, |actor| async move {
            actor
                .add_watch(draft.name, draft.description, draft.price, draft.image)
                .await
        })
        .await
    }

    pub async fn update_watch(&self, patch: WatchPatch) -> Result<(), AppError> {
        self.run(MutationKind::UpdateWatch, |actor| async move {
            actor
                .update_watch(
                    patch.id,
                    patch.name,
                    patch.description,
                    patch.price,
                    patch.published,
                )
                .await
        })
        .await
    }

    pub async fn delete_watch(&self, id: WatchId) -> Result<(), AppError> {
        self.run(MutationKind::DeleteWatch, |actor| async move {
            actor.delete_watch(id).await
        })
        .await
    }

    pub async fn place_order(&self, draft: OrderDraft) -> Result<OrderId, AppError> {
        self.run(MutationKind::PlaceOrder, |actor| async move {
            actor
                .place_order(
                    draft.customer_name,
                    draft.contact_info,
                    draft.watch_id,
                    draft.note,
                )
                .await
        })
        .await
    }

    pub async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<(), AppError> {
        self.run(MutationKind::UpdateOrderStatus, |actor| async move {
            actor.update_order_status(id, status).await
        })
        .await
    }

    pub async fn send_message(&self, draft: ChatDraft) -> Result<MessageId, AppError> {
        self.run(MutationKind::SendMessage, |actor| async move {
            actor
                .send_message(draft.sender_name, draft.text, draft.image)
                .await
        })
        .await
    }

    pub async fn reply_to_message(&self, draft: ReplyDraft) -> Result<MessageId, AppError> {
        self.run(MutationKind::ReplyToMessage, |actor| async move {
            actor.reply_to_message(draft.message_id, draft.text).await
        })
        .await
    }

    pub async fn save_profile(&self, draft: ProfileDraft) -> Result<(), AppError> {
        self.run(MutationKind::SaveProfile, |actor| async move {
            actor
                .save_caller_profile(UserProfile { name: draft.name })
                .await
        })
        .await
    }

    /// Issue one remote call; invalidate declared keys only on success.
    ///
    /// Fails fast with [`ActorError::NotConnected`] before any call when the
    /// handle is empty.
    async fn run<T, F, Fut>(&self, kind: MutationKind, call: F) -> Result<T, AppError>
    where
        F: FnOnce(Arc<dyn StoreActor>) -> Fut,
        Fut: Future<Output = Result<T, ActorError>>,
    {
        counter!("vetrina_mutation_total", "op" => kind.as_str()).increment(1);
        let actor = self.queries.handle().require().inspect_err(|_| {
            counter!("vetrina_mutation_error_total", "op" => kind.as_str()).increment(1);
        })?;

        match call(actor).await {
            Ok(value) => {
                debug!(op = kind.as_str(), "mutation succeeded");
                for key in kind.invalidates() {
                    self.queries.invalidate(*key);
                }
                Ok(value)
            }
            Err(error) => {
                warn!(op = kind.as_str(), %error, "mutation failed");
                counter!("vetrina_mutation_error_total", "op" => kind.as_str()).increment(1);
                Err(error.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_sets_cover_the_touched_resources() {
        assert_eq!(
            MutationKind::AddWatch.invalidates(),
            &[ResourceKey::Watches]
        );
        assert_eq!(
            MutationKind::PlaceOrder.invalidates(),
            &[ResourceKey::Orders]
        );
        assert_eq!(
            MutationKind::SaveProfile.invalidates(),
            &[ResourceKey::CallerProfile]
        );
    }
}
