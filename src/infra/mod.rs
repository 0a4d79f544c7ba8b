//! Infrastructure concerns: telemetry installation and metric descriptions.

mod error;
pub mod telemetry;

pub use error::InfraError;
