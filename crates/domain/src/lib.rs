pub mod aggregates;
pub mod errors;

pub use aggregates::order::{compute_total, Order, OrderItem};
pub use errors::DomainError;
