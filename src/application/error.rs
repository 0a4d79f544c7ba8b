use thiserror::Error;

use crate::backend::ActorError;
use crate::domain::error::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Actor(#[from] ActorError),
}

impl AppError {
    /// Whether the failure came from caller-side input validation, meaning no
    /// remote call was made.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Domain(error) if error.is_validation())
    }
}
