//! IP address pool management.
//!
//! This module carves IPv4 CIDR blocks into individually assignable host
//! addresses and hands them out one at a time for VM provisioning. A
//! [`PoolRegistry`] owns named [`AddressPool`]s; each pool tracks which of
//! its usable addresses are available, used or excluded.

pub mod cidr;
pub mod pool;
pub mod registry;

use std::net::Ipv4Addr;

// Re-export commonly used types
pub use cidr::Cidr;
pub use pool::{AddressPool, AvailableIps, PoolSnapshot, PoolSummary};
pub use registry::PoolRegistry;

/// Errors raised by pool and registry operations.
///
/// Every failing call leaves the registry and its pools exactly as they were.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Pool '{name}' already exists")]
    DuplicateName { name: String },

    #[error("Pool '{name}' not found")]
    NotFound { name: String },

    #[error("Pool '{name}' has no available addresses")]
    PoolExhausted { name: String },

    #[error("Address {address} is not allocated in pool '{pool}'")]
    NotAllocated { pool: String, address: Ipv4Addr },
}
