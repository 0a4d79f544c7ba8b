//! Resource-keyed query cache.
//!
//! One [`ResourceKey`] per remote-backed value, one slot per key. Reads go
//! through [`QueryClient`], which serves fresh entries locally, coalesces
//! concurrent fetches, and survives fetch failures by holding on to the last
//! good value. Writers never touch the cache directly; they invalidate keys
//! and the client refetches.

mod client;
mod config;
mod entry;
mod keys;
mod slot;
mod store;

pub use client::QueryClient;
pub use config::CacheConfig;
pub use entry::{CacheEntry, FetchStatus};
pub use keys::ResourceKey;
