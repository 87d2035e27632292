//! Domain layer: models and the shared error taxonomy. No I/O lives here.

pub mod error;
pub mod models;
pub mod ports;

pub use error::{DomainError, DomainResult, ErrorKind};
