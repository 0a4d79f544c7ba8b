//! Remote actor client seam and its in-memory implementation.

mod actor;
pub mod memory;

pub use actor::{ActorError, ActorHandle, StoreActor};
pub use memory::MemoryActor;
