use domain::DomainError;
use order_store::{OrderLookup, StoreError};
use thiserror::Error;

/// Coarse classification callers branch on, e.g. to pick an HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Store,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] DomainError),

    #[error("Order not found: {0}")]
    NotFound(OrderLookup),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Validation(_) => ErrorKind::Validation,
            ServiceError::NotFound(_) => ErrorKind::NotFound,
            ServiceError::Conflict(_) => ErrorKind::Conflict,
            ServiceError::Store(_) => ErrorKind::Store,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(lookup) => ServiceError::NotFound(lookup),
            StoreError::Conflict(message) => ServiceError::Conflict(message),
            other => ServiceError::Store(other),
        }
    }
}
