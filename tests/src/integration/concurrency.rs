//! # Concurrency
//!
//! Many dispatcher threads hammering one pool. The pool must never hold
//! more live operations than its capacity and never hand one slot to two
//! live operations at once.

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use rand::{Rng, RngCore};
    use shared_types::{OperationHandle, PartitionId, StatusCode};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;

    use sp_crypto_operations::{HashAlgorithm, HashApi, MacAlgorithm, MacApi, KeyMaterial};

    use crate::fixtures::dispatched;

    const CAPACITY: usize = 4;
    const THREADS: i32 = 8;
    const ROUNDS: usize = 200;

    #[test]
    fn test_concurrent_setup_finish_respects_capacity() {
        let (service, identity) = dispatched(CAPACITY);
        let live: Arc<Mutex<HashSet<u32>>> = Arc::new(Mutex::new(HashSet::new()));
        let peak = Arc::new(AtomicUsize::new(0));
        let exhausted = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (1..=THREADS)
            .map(|n| {
                let service = Arc::clone(&service);
                let identity = Arc::clone(&identity);
                let live = Arc::clone(&live);
                let peak = Arc::clone(&peak);
                let exhausted = Arc::clone(&exhausted);

                thread::spawn(move || {
                    let _caller = identity.bind(PartitionId(-n));
                    let mut rng = rand::thread_rng();

                    for _ in 0..ROUNDS {
                        let mut handle = OperationHandle::INVALID;
                        match service.hash_setup(&mut handle, HashAlgorithm::Sha256) {
                            Ok(()) => {}
                            Err(err) => {
                                assert_eq!(err.status(), StatusCode::InsufficientMemory);
                                exhausted.fetch_add(1, Ordering::Relaxed);
                                thread::yield_now();
                                continue;
                            }
                        }

                        {
                            let mut held = live.lock();
                            assert!(held.insert(handle.raw()), "slot assigned twice");
                            peak.fetch_max(held.len(), Ordering::Relaxed);
                        }

                        let mut chunk = vec![0u8; rng.gen_range(0..64)];
                        rng.fill_bytes(&mut chunk);
                        service.hash_update(&mut handle, &chunk).unwrap();

                        live.lock().remove(&handle.raw());
                        if rng.gen_bool(0.5) {
                            assert_eq!(service.hash_finish(&mut handle).unwrap().len(), 32);
                        } else {
                            service.hash_abort(&mut handle).unwrap();
                        }
                        assert!(!handle.is_valid());
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }

        assert!(peak.load(Ordering::Relaxed) <= CAPACITY);
        assert_eq!(service.status().in_use, 0);

        let metrics = service.metrics();
        assert_eq!(metrics.pool_exhaustions as usize, exhausted.load(Ordering::Relaxed));
        assert_eq!(
            metrics.operations_started,
            metrics.operations_completed + metrics.operations_aborted
        );
        assert_eq!(identity.active_bindings(), 0);
    }

    #[test]
    fn test_partitions_never_see_each_other_under_load() {
        let (service, identity) = dispatched(CAPACITY);

        let workers: Vec<_> = (1..=THREADS)
            .map(|n| {
                let service = Arc::clone(&service);
                let identity = Arc::clone(&identity);

                thread::spawn(move || {
                    let _caller = identity.bind(PartitionId(-n));
                    for _ in 0..ROUNDS {
                        let mut mine = OperationHandle::INVALID;
                        let key = KeyMaterial::from_slice(&n.to_le_bytes());
                        if service
                            .mac_sign_setup(&mut mine, key, MacAlgorithm::HmacSha256)
                            .is_err()
                        {
                            thread::yield_now();
                            continue;
                        }

                        // Every other live slot belongs to another partition.
                        for raw in 1..=CAPACITY as u32 {
                            let mut guessed = OperationHandle::from_raw(raw);
                            if guessed == mine {
                                continue;
                            }
                            assert_eq!(
                                service.mac_update(&mut guessed, b"guess").unwrap_err().status(),
                                StatusCode::BadState
                            );
                        }
                        assert_eq!(service.caller_handles().unwrap(), vec![mine]);
                        service.mac_sign_finish(&mut mine).unwrap();
                    }
                })
            })
            .collect();

        for worker in workers {
            worker.join().unwrap();
        }
        assert_eq!(service.status().in_use, 0);
    }
}
