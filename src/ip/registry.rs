//! Named pool registry.
//!
//! The registry is an ordinary value: build one at start-up and hand it (or an
//! `Arc` of it) to every collaborator that provisions addresses.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::info;

use super::{AddressPool, PoolError, PoolSummary};
use crate::config::Config;

/// Registry of address pools keyed by case-sensitive name
#[derive(Debug, Default)]
pub struct PoolRegistry {
    pools: RwLock<HashMap<String, Arc<AddressPool>>>,
}

impl PoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding every pool defined in the configuration
    pub fn from_config(config: &Config) -> Result<Self, PoolError> {
        let registry = Self::new();
        for definition in &config.pools {
            registry.create_pool(&definition.name, &definition.cidr, &definition.excluded)?;
        }
        Ok(registry)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<AddressPool>>> {
        self.pools.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<AddressPool>>> {
        self.pools.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and register a pool.
    ///
    /// Nothing is registered unless the pool is built successfully.
    pub fn create_pool<S: AsRef<str>>(
        &self,
        name: &str,
        cidr: &str,
        excluded: &[S],
    ) -> Result<Arc<AddressPool>, PoolError> {
        if name.trim().is_empty() {
            return Err(PoolError::InvalidArgument("pool name cannot be empty".to_string()));
        }
        if cidr.trim().is_empty() {
            return Err(PoolError::InvalidArgument("CIDR cannot be empty".to_string()));
        }

        let mut pools = self.write();
        if pools.contains_key(name) {
            return Err(PoolError::DuplicateName { name: name.to_string() });
        }

        let pool = Arc::new(AddressPool::new(name, cidr, excluded)?);
        pools.insert(name.to_string(), Arc::clone(&pool));
        info!("Registered pool {} ({})", name, pool.cidr());
        Ok(pool)
    }

    pub fn get_pool(&self, name: &str) -> Result<Arc<AddressPool>, PoolError> {
        self.read()
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::NotFound { name: name.to_string() })
    }

    /// All registered pools, sorted by name
    pub fn get_pools(&self) -> Vec<Arc<AddressPool>> {
        let mut pools: Vec<Arc<AddressPool>> = self.read().values().cloned().collect();
        pools.sort_by(|a, b| a.name().cmp(b.name()));
        pools
    }

    /// Unregister a pool. Callers still holding its `Arc` keep a usable pool.
    pub fn remove_pool(&self, name: &str) -> Result<(), PoolError> {
        match self.write().remove(name) {
            Some(_) => {
                info!("Removed pool {}", name);
                Ok(())
            }
            None => Err(PoolError::NotFound { name: name.to_string() }),
        }
    }

    pub fn clear_pools(&self) {
        let mut pools = self.write();
        if !pools.is_empty() {
            info!("Removing all {} pools", pools.len());
            pools.clear();
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Summaries of every pool, sorted by name
    pub fn summaries(&self) -> Vec<PoolSummary> {
        self.get_pools().iter().map(|pool| pool.summary()).collect()
    }

    /// The registered pool whose usable range contains `addr`, if any
    pub fn find_pool_for(&self, addr: Ipv4Addr) -> Option<Arc<AddressPool>> {
        self.get_pools().into_iter().find(|pool| pool.contains(addr))
    }
}
