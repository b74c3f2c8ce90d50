//! # vmnet-ipam - IPv4 address pools for VM provisioning
//!
//! This library carves IPv4 CIDR blocks into individually assignable host
//! addresses and hands them out one at a time as virtual machines are
//! provisioned, taking them back when the machines are torn down.
//!
//! ## Overview
//!
//! A [`PoolRegistry`](ip::PoolRegistry) owns named
//! [`AddressPool`](ip::AddressPool)s. Each pool knows its network and
//! broadcast address and partitions its usable addresses into three
//! disjoint sets:
//!
//! - **available**: handed out first-in first-out, never-issued addresses
//!   in ascending order
//! - **used**: currently assigned to a VM
//! - **excluded**: never handed out (gateways, DNS servers, ...)
//!
//! State lives in memory for the life of the process; nothing is persisted.
//!
//! ## Architecture
//!
//! - `ip`: CIDR arithmetic, address pools and the pool registry
//! - `config`: YAML configuration structures and validation
//! - `config_loader`: Configuration file loading and registry construction
//!
//! ## Example Usage
//!
//! ```rust
//! use vmnet_ipam::ip::PoolRegistry;
//!
//! let registry = PoolRegistry::new();
//! let lan = registry.create_pool("LAN", "192.168.1.0/24", &["192.168.1.1"])?;
//!
//! let vm_ip = lan.allocate()?;
//! assert_eq!(vm_ip.to_string(), "192.168.1.2");
//!
//! lan.release(vm_ip)?;
//! assert_eq!(lan.summary().available_ips, 253);
//! # Ok::<(), vmnet_ipam::ip::PoolError>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   log_level: info
//!
//! pools:
//!   - name: LAN
//!     cidr: 192.168.1.0/24
//!     excluded: [192.168.1.1, 192.168.1.254]
//!   - name: DMZ
//!     cidr: 172.16.0.0/28
//! ```
//!
//! ## Concurrency
//!
//! Pools are shared as `Arc<AddressPool>`. The registry map sits behind a
//! read-write lock and every pool guards its partitions with its own mutex,
//! so provisioning threads may allocate from different pools in parallel.
//!
//! ## Error Handling
//!
//! Pool and registry operations return [`PoolError`](ip::PoolError); a failed
//! call never leaves a pool or the registry partially updated. Configuration
//! loading and the `vmnet-ipam` binary use `color_eyre` for error reports with
//! context.

pub mod config;
pub mod config_loader;
pub mod ip;
