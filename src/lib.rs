//! Vetrina: client-side state layer for a boutique watch storefront.
//!
//! The crate sits between a UI and a remote store actor. Reads go through a
//! resource-keyed query cache that coalesces concurrent fetches and keeps the
//! last good value across failures; writes go through a mutation executor
//! that calls the backend exactly once and invalidates the affected
//! resources; the chat session keeps an optimistic local transcript that is
//! never reconciled against server history.

pub mod application;
pub mod backend;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub(crate) mod util;

pub use application::{AppError, ChatSession, MutationExecutor, NoticeLog, NoticeSink};
pub use backend::{ActorError, ActorHandle, MemoryActor, StoreActor};
pub use cache::{CacheConfig, CacheEntry, FetchStatus, QueryClient, ResourceKey};
