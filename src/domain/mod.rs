//! Domain layer types and invariants.

pub mod blob;
pub mod entities;
pub mod error;
pub mod forms;
pub mod price;
pub mod types;
