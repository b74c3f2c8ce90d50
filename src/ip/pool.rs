//! Address pool for a single CIDR block.
//!
//! Usable addresses move between three disjoint partitions: available,
//! used and excluded. Available addresses are handed out first-in
//! first-out. Addresses that have never been issued are produced lazily by
//! an ascending cursor over the usable range, so creating a pool costs the
//! same for a /8 as for a /30. Addresses returned by `release` or `clear`
//! queue up behind the cursor.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::net::Ipv4Addr;
use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{Cidr, PoolError};

/// Read-only report of a pool's configuration and current counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSummary {
    pub name: String,
    pub cidr: String,
    pub network_address: Ipv4Addr,
    pub broadcast_address: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
    pub prefix_length: u8,
    pub total_ips: u64,
    pub available_ips: u64,
    pub used_ips: u64,
    pub excluded_ips: u64,
}

/// The record a caller keeps to rebuild a pool after a restart: create the
/// pool from `name`, `cidr` and `excluded`, then re-allocate `used`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub name: String,
    pub cidr: String,
    pub excluded: Vec<Ipv4Addr>,
    pub used: Vec<Ipv4Addr>,
}

/// Mutable partitions of a pool, guarded by the pool's lock
#[derive(Debug)]
struct PoolState {
    /// Never-issued usable addresses still ahead of the cursor; `None` for a
    /// block without usable hosts
    fresh: Option<RangeInclusive<u32>>,
    /// Released addresses waiting to be reissued, oldest first
    returned: VecDeque<Ipv4Addr>,
    used: HashSet<Ipv4Addr>,
}

impl PoolState {
    /// Advance the cursor to the next non-excluded address
    fn take_fresh(&mut self, excluded: &BTreeSet<Ipv4Addr>) -> Option<Ipv4Addr> {
        self.fresh
            .as_mut()?
            .map(Ipv4Addr::from)
            .find(|addr| !excluded.contains(addr))
    }
}

/// Available addresses in the order `allocate` would issue them.
///
/// Holds a copy of the cursor and the release queue taken at creation, so it
/// does not keep the pool locked and never materializes the unissued range.
#[derive(Debug, Clone)]
pub struct AvailableIps<'a> {
    fresh: Option<RangeInclusive<u32>>,
    excluded: &'a BTreeSet<Ipv4Addr>,
    returned: std::collections::vec_deque::IntoIter<Ipv4Addr>,
}

impl Iterator for AvailableIps<'_> {
    type Item = Ipv4Addr;

    fn next(&mut self) -> Option<Ipv4Addr> {
        if let Some(fresh) = self.fresh.as_mut() {
            let excluded = self.excluded;
            if let Some(addr) = fresh.map(Ipv4Addr::from).find(|addr| !excluded.contains(addr)) {
                return Some(addr);
            }
            self.fresh = None;
        }
        self.returned.next()
    }
}

/// One CIDR block's address space.
///
/// All operations take `&self`; the partitions sit behind a mutex so a pool
/// can be shared between provisioning threads through an `Arc`.
#[derive(Debug)]
pub struct AddressPool {
    name: String,
    cidr: Cidr,
    /// Every excluded address that was supplied, in or out of range
    excluded: BTreeSet<Ipv4Addr>,
    /// How many excluded addresses fall inside the usable range
    excluded_in_range: u64,
    state: Mutex<PoolState>,
}

impl AddressPool {
    /// Create a pool from a CIDR string and a list of addresses never to issue.
    ///
    /// Fails with `InvalidArgument` if `name` or `cidr` is empty, `cidr` is not
    /// `a.b.c.d/prefix` with a prefix in 0..=32, or any excluded entry is not
    /// an IPv4 address. Excluded addresses outside the usable range are kept
    /// in the excluded list but do not count against the pool.
    pub fn new<S: AsRef<str>>(name: &str, cidr: &str, excluded: &[S]) -> Result<Self, PoolError> {
        if name.trim().is_empty() {
            return Err(PoolError::InvalidArgument("pool name cannot be empty".to_string()));
        }
        let cidr: Cidr = cidr.parse()?;

        let mut excluded_set = BTreeSet::new();
        for entry in excluded {
            let entry = entry.as_ref().trim();
            let addr = entry.parse::<Ipv4Addr>().map_err(|_| {
                PoolError::InvalidArgument(format!(
                    "excluded address '{}' is not a valid IPv4 address",
                    entry
                ))
            })?;
            excluded_set.insert(addr);
        }

        Ok(Self::with_cidr(name, cidr, excluded_set))
    }

    /// Create a pool from an already-parsed block
    pub fn with_cidr(name: &str, cidr: Cidr, excluded: BTreeSet<Ipv4Addr>) -> Self {
        let mut excluded_in_range = 0;
        for addr in &excluded {
            if cidr.contains_host(*addr) {
                excluded_in_range += 1;
            } else {
                warn!(
                    "Excluded address {} is outside the usable range of pool {} ({})",
                    addr, name, cidr
                );
            }
        }

        info!(
            "Created address pool {} ({}) with {} usable addresses, {} excluded",
            name,
            cidr,
            cidr.host_count(),
            excluded_in_range
        );

        Self {
            name: name.to_string(),
            cidr,
            excluded,
            excluded_in_range,
            state: Mutex::new(PoolState {
                fresh: cidr.host_range().map(|(first, last)| first..=last),
                returned: VecDeque::new(),
                used: HashSet::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PoolState> {
        // Every transition completes under a single guard; poisoned state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cidr(&self) -> Cidr {
        self.cidr
    }

    pub fn network_address(&self) -> Ipv4Addr {
        self.cidr.network()
    }

    pub fn broadcast_address(&self) -> Ipv4Addr {
        self.cidr.broadcast()
    }

    pub fn subnet_mask(&self) -> Ipv4Addr {
        self.cidr.mask()
    }

    pub fn prefix_length(&self) -> u8 {
        self.cidr.prefix_len()
    }

    /// Usable addresses in the block, network and broadcast excluded
    pub fn total_ips(&self) -> u64 {
        self.cidr.host_count()
    }

    /// Issue the address at the head of the available queue.
    ///
    /// Never-issued addresses come out in ascending order; once those run out,
    /// released addresses come out in the order they were released.
    pub fn allocate(&self) -> Result<Ipv4Addr, PoolError> {
        let mut state = self.state();

        let addr = match state.take_fresh(&self.excluded) {
            Some(addr) => addr,
            None => state.returned.pop_front().ok_or_else(|| PoolError::PoolExhausted {
                name: self.name.clone(),
            })?,
        };

        state.used.insert(addr);
        debug!("Allocated {} from pool {}", addr, self.name);
        Ok(addr)
    }

    /// Return a used address to the tail of the available queue
    pub fn release(&self, addr: Ipv4Addr) -> Result<(), PoolError> {
        let mut state = self.state();

        if !state.used.remove(&addr) {
            return Err(PoolError::NotAllocated {
                pool: self.name.clone(),
                address: addr,
            });
        }

        state.returned.push_back(addr);
        debug!("Released {} back to pool {}", addr, self.name);
        Ok(())
    }

    /// Move every used address back to available, in ascending address order.
    ///
    /// Returns how many addresses were reclaimed.
    pub fn clear(&self) -> usize {
        let mut state = self.state();

        let mut reclaimed: Vec<Ipv4Addr> = state.used.drain().collect();
        reclaimed.sort_unstable();
        let count = reclaimed.len();
        state.returned.extend(reclaimed);

        info!("Cleared {} used addresses in pool {}", count, self.name);
        count
    }

    /// Whether `addr` is currently allocated
    pub fn is_allocated(&self, addr: Ipv4Addr) -> bool {
        self.state().used.contains(&addr)
    }

    /// Whether `addr` is a usable host of this block (excluded or not)
    pub fn contains(&self, addr: Ipv4Addr) -> bool {
        self.cidr.contains_host(addr)
    }

    pub fn used_count(&self) -> u64 {
        self.state().used.len() as u64
    }

    pub fn available_count(&self) -> u64 {
        self.available_given(self.state().used.len())
    }

    /// Excluded addresses that lie inside the usable range
    pub fn excluded_count(&self) -> u64 {
        self.excluded_in_range
    }

    fn available_given(&self, used: usize) -> u64 {
        self.total_ips() - self.excluded_in_range - used as u64
    }

    /// Currently allocated addresses, in ascending order
    pub fn used_ips(&self) -> Vec<Ipv4Addr> {
        let mut used: Vec<Ipv4Addr> = self.state().used.iter().copied().collect();
        used.sort_unstable();
        used
    }

    /// Available addresses in the order `allocate` would issue them.
    ///
    /// The pool is locked only long enough to copy the cursor and the release
    /// queue; later allocations are not reflected in the returned iterator.
    pub fn available_ips(&self) -> AvailableIps<'_> {
        let state = self.state();
        AvailableIps {
            fresh: state.fresh.clone(),
            excluded: &self.excluded,
            returned: state.returned.clone().into_iter(),
        }
    }

    /// The first `limit` addresses `allocate` would issue
    pub fn available_ips_head(&self, limit: usize) -> Vec<Ipv4Addr> {
        self.available_ips().take(limit).collect()
    }

    /// Every excluded address supplied at creation, in ascending order
    pub fn excluded_ips(&self) -> Vec<Ipv4Addr> {
        self.excluded.iter().copied().collect()
    }

    pub fn summary(&self) -> PoolSummary {
        let used = self.state().used.len();

        PoolSummary {
            name: self.name.clone(),
            cidr: self.cidr.to_string(),
            network_address: self.network_address(),
            broadcast_address: self.broadcast_address(),
            subnet_mask: self.subnet_mask(),
            prefix_length: self.prefix_length(),
            total_ips: self.total_ips(),
            available_ips: self.available_given(used),
            used_ips: used as u64,
            excluded_ips: self.excluded_in_range,
        }
    }

    pub fn snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            name: self.name.clone(),
            cidr: self.cidr.to_string(),
            excluded: self.excluded_ips(),
            used: self.used_ips(),
        }
    }
}
