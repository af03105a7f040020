use thiserror::Error;

use crate::document::ValidationError;
use crate::store::StoreError;

/// Domain error returned by every service operation.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoreError {
    /// `"<entity> not found"`.
    pub fn not_found(entity: &str) -> Self {
        CoreError::NotFound(format!("{entity} not found"))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
