pub mod errors;
pub mod keys;
pub mod service;

pub use errors::{ErrorKind, ServiceError};
pub use service::{OrderService, DEFAULT_CACHE_TTL};
