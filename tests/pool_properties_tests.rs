#[cfg(test)]
mod pool_properties_tests {
    use std::collections::HashSet;
    use std::net::Ipv4Addr;
    use std::sync::Arc;
    use std::thread;

    use vmnet_ipam::ip::{AddressPool, PoolError, PoolRegistry};

    const NO_EXCLUSIONS: &[&str] = &[];

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    /// Total usable addresses follow 2^(32-p) - 2 for every prefix up to /30
    #[test]
    fn test_total_ips_formula() {
        let registry = PoolRegistry::new();
        for prefix in 0..=30u32 {
            let name = format!("p{}", prefix);
            let pool = registry
                .create_pool(&name, &format!("10.0.0.0/{}", prefix), NO_EXCLUSIONS)
                .unwrap();
            let summary = pool.summary();

            assert_eq!(summary.total_ips, (1u64 << (32 - prefix)) - 2, "prefix /{}", prefix);
            assert_eq!(summary.available_ips, summary.total_ips);
            assert_eq!(summary.used_ips, 0);
            assert_eq!(summary.excluded_ips, 0);
        }
    }

    /// Fresh pools report k excluded and total - k available
    #[test]
    fn test_initial_counts_with_exclusions() {
        for prefix in [22u8, 24, 26, 28, 30] {
            let cidr = format!("10.9.0.0/{}", prefix);
            let pool = AddressPool::new("p", &cidr, &["10.9.0.1", "10.9.0.2"]).unwrap();
            let summary = pool.summary();

            assert_eq!(summary.excluded_ips, 2);
            assert_eq!(summary.available_ips, summary.total_ips - 2);
            assert_eq!(summary.used_ips, 0);
        }
    }

    /// Allocations stay strictly inside the block and off the excluded list,
    /// and the pool runs dry after exactly total - excluded allocations
    #[test]
    fn test_allocation_bounds_and_exhaustion() {
        for prefix in 24..=30u8 {
            let excluded = ["172.16.4.1", "172.16.4.3"];
            let pool = AddressPool::new("p", &format!("172.16.4.0/{}", prefix), &excluded).unwrap();
            let network = u32::from(pool.network_address());
            let broadcast = u32::from(pool.broadcast_address());
            let expected = pool.total_ips() - pool.excluded_count();

            let mut seen = HashSet::new();
            for _ in 0..expected {
                let addr = pool.allocate().unwrap();
                let value = u32::from(addr);
                assert!(value > network && value < broadcast, "{} outside /{}", addr, prefix);
                assert!(!excluded.contains(&addr.to_string().as_str()));
                assert!(seen.insert(addr), "{} issued twice", addr);
            }

            assert!(matches!(pool.allocate(), Err(PoolError::PoolExhausted { .. })));
            assert_eq!(pool.used_count() + pool.excluded_count(), pool.total_ips());
        }
    }

    /// After a bulk clear the pool hands out every usable, non-excluded
    /// address exactly once more and then runs dry
    #[test]
    fn test_exhaustion_after_clear() {
        for (prefix, held) in [(24u8, 0usize), (26, 17), (28, 5), (29, 4), (30, 1)] {
            let excluded = ["10.50.0.2", "10.50.0.9"];
            let pool = AddressPool::new("p", &format!("10.50.0.0/{}", prefix), &excluded).unwrap();
            let total = pool.total_ips();
            let in_range = pool.excluded_count();

            let check_partition = |pool: &AddressPool| {
                assert_eq!(pool.used_count() + pool.available_count() + in_range, total);
            };

            for _ in 0..held {
                pool.allocate().unwrap();
                check_partition(&pool);
            }
            assert_eq!(pool.clear(), held);
            check_partition(&pool);
            assert_eq!(pool.used_count(), 0);

            let mut seen = HashSet::new();
            for _ in 0..(total - in_range) {
                let addr = pool.allocate().unwrap();
                assert!(pool.contains(addr), "{} outside /{}", addr, prefix);
                assert!(!excluded.contains(&addr.to_string().as_str()), "{} is excluded", addr);
                assert!(seen.insert(addr), "{} issued twice after clear", addr);
                check_partition(&pool);
            }

            assert!(matches!(pool.allocate(), Err(PoolError::PoolExhausted { .. })));
            assert_eq!(pool.available_count(), 0);
            check_partition(&pool);
        }
    }

    /// Allocate followed by release restores the counts
    #[test]
    fn test_round_trip_restores_counts() {
        let pool = AddressPool::new("p", "192.168.50.0/25", &["192.168.50.10"]).unwrap();
        for _ in 0..20 {
            pool.allocate().unwrap();
        }

        let before = pool.summary();
        let addr = pool.allocate().unwrap();
        pool.release(addr).unwrap();
        let after = pool.summary();

        assert_eq!(before.available_ips, after.available_ips);
        assert_eq!(before.used_ips, after.used_ips);
    }

    /// Releasing an address that was never handed out changes nothing
    #[test]
    fn test_release_of_unallocated_address() {
        let pool = AddressPool::new("p", "192.168.50.0/24", &["192.168.50.10"]).unwrap();
        pool.allocate().unwrap();
        let before = pool.summary();

        let never_issued = [
            "192.168.50.10",
            "192.168.50.200",
            "192.168.50.0",
            "192.168.50.255",
            "8.8.8.8",
        ];
        for addr in never_issued {
            assert!(matches!(
                pool.release(ip(addr)),
                Err(PoolError::NotAllocated { .. })
            ));
        }

        assert_eq!(pool.summary(), before);
    }

    /// The three partitions always add up to the usable range
    #[test]
    fn test_partitions_stay_disjoint() {
        let excluded = ["10.0.0.5", "10.0.0.6", "10.0.0.99"];
        let pool = AddressPool::new("p", "10.0.0.0/27", &excluded).unwrap();
        let mut held = Vec::new();

        for round in 0..40 {
            if round % 3 == 2 {
                if let Some(addr) = held.pop() {
                    pool.release(addr).unwrap();
                }
            } else if let Ok(addr) = pool.allocate() {
                held.push(addr);
            }

            let available: HashSet<Ipv4Addr> = pool.available_ips().collect();
            let used: HashSet<Ipv4Addr> = pool.used_ips().into_iter().collect();
            let excluded: HashSet<Ipv4Addr> = pool
                .excluded_ips()
                .into_iter()
                .filter(|addr| pool.contains(*addr))
                .collect();

            assert!(available.is_disjoint(&used));
            assert!(available.is_disjoint(&excluded));
            assert!(used.is_disjoint(&excluded));
            assert_eq!(
                (available.len() + used.len() + excluded.len()) as u64,
                pool.total_ips()
            );
            assert_eq!(available.len() as u64, pool.available_count());
        }
    }

    #[test]
    fn test_scenario_lan() {
        let registry = PoolRegistry::new();
        let pool = registry.create_pool("LAN", "192.168.1.0/24", NO_EXCLUSIONS).unwrap();

        let summary = pool.summary();
        assert_eq!((summary.total_ips, summary.available_ips, summary.used_ips), (254, 254, 0));

        assert_eq!(pool.allocate().unwrap(), ip("192.168.1.1"));
        assert_eq!(pool.allocate().unwrap(), ip("192.168.1.2"));
        let summary = pool.summary();
        assert_eq!((summary.available_ips, summary.used_ips), (252, 2));

        pool.release(ip("192.168.1.1")).unwrap();
        let summary = pool.summary();
        assert_eq!((summary.available_ips, summary.used_ips), (253, 1));
    }

    #[test]
    fn test_scenario_exclusions() {
        let registry = PoolRegistry::new();
        let pool = registry
            .create_pool("X", "192.168.1.0/24", &["192.168.1.1", "192.168.1.254"])
            .unwrap();

        let summary = pool.summary();
        assert_eq!(summary.total_ips, 254);
        assert_eq!(summary.excluded_ips, 2);
        assert_eq!(summary.available_ips, 252);

        while let Ok(addr) = pool.allocate() {
            assert_ne!(addr, ip("192.168.1.1"));
            assert_ne!(addr, ip("192.168.1.254"));
        }
    }

    #[test]
    fn test_scenario_registry_errors() {
        let registry = PoolRegistry::new();
        assert!(matches!(
            registry.get_pool("missing"),
            Err(PoolError::NotFound { .. })
        ));

        registry.create_pool("X", "192.168.1.0/24", NO_EXCLUSIONS).unwrap();
        assert!(matches!(
            registry.create_pool("X", "192.168.1.0/24", NO_EXCLUSIONS),
            Err(PoolError::DuplicateName { .. })
        ));
    }

    /// Threads provisioning from several pools through one shared registry
    #[test]
    fn test_shared_registry_across_threads() {
        let registry = Arc::new(PoolRegistry::new());
        registry.create_pool("a", "10.10.0.0/24", NO_EXCLUSIONS).unwrap();
        registry.create_pool("b", "10.20.0.0/24", &["10.20.0.1"]).unwrap();

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let pool = registry.get_pool(if i % 2 == 0 { "a" } else { "b" }).unwrap();
                    let mine: Vec<Ipv4Addr> = (0..40).map(|_| pool.allocate().unwrap()).collect();
                    for addr in &mine[..10] {
                        pool.release(*addr).unwrap();
                    }
                    mine[10..].to_vec()
                })
            })
            .collect();

        let mut kept = HashSet::new();
        for handle in handles {
            for addr in handle.join().unwrap() {
                assert!(kept.insert(addr));
            }
        }

        assert_eq!(kept.len(), 180);
        let a = registry.get_pool("a").unwrap();
        let b = registry.get_pool("b").unwrap();
        assert_eq!(a.used_count(), 90);
        assert_eq!(b.used_count(), 90);
        assert_eq!(b.available_count(), 253 - 90);
    }
}
