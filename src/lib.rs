//! Agent coordination kernel: partitioned memory, consensus, GOAP planning,
//! layered recovery, cost-aware model routing, and cross-domain transfer
//! learning for a QE agent fleet.

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod kernel;
pub mod services;

pub use domain::{DomainError, DomainResult, ErrorKind};
pub use kernel::Kernel;
