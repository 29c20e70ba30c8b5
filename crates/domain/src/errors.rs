use thiserror::Error;

/// Validation failures raised before any I/O happens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Order must have at least one item")]
    NoItems,

    #[error("Invalid item at position {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("Order total overflows the monetary range")]
    TotalOverflow,

    #[error("Validation error: {0}")]
    ValidationError(String),
}
