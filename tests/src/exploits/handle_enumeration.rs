//! # Handle Enumeration
//!
//! **Attack:** a partition walks the whole handle space (including
//! `INVALID` and values past the pool) hoping that some response differs
//! between "free", "foreign", "wrong kind" and "out of range", leaking
//! occupancy of other partitions.
//!
//! **Defense:** every unresolvable handle yields the identical `BadState`
//! and leaves both the handle and the pool untouched.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use shared_types::{OperationHandle, StatusCode};
    use sp_crypto_operations::testing::partitions::{NS_CLIENT_A, NS_CLIENT_B, SECURE_PARTITION};
    use sp_crypto_operations::{
        CryptoServiceError, HashAlgorithm, HashApi, KeyDerivationAlgorithm, KeyDerivationApi,
        MacApi, PoolStatus,
    };

    use crate::fixtures::{dispatched, DispatchedService};

    const CAPACITY: usize = 8;

    /// Fills half the pool with hashes owned by partition A and one
    /// derivation owned by the secure partition.
    fn occupied_pool() -> (
        std::sync::Arc<DispatchedService>,
        std::sync::Arc<shared_types::DispatchedCaller>,
        PoolStatus,
    ) {
        let (service, identity) = dispatched(CAPACITY);
        {
            let _caller = identity.bind(NS_CLIENT_A);
            for _ in 0..4 {
                let mut h = OperationHandle::INVALID;
                service.hash_setup(&mut h, HashAlgorithm::Sha256).unwrap();
            }
        }
        {
            let _caller = identity.bind(SECURE_PARTITION);
            let mut h = OperationHandle::INVALID;
            service
                .key_derivation_setup(&mut h, KeyDerivationAlgorithm::DeviceSecret)
                .unwrap();
        }
        let status = service.status();
        (service, identity, status)
    }

    #[test]
    fn test_sweep_yields_uniform_rejection() {
        let (service, identity, before) = occupied_pool();
        let _caller = identity.bind(NS_CLIENT_B);

        let mut responses = Vec::new();
        for raw in 0..=(CAPACITY as u32 + 4) {
            let mut h = OperationHandle::from_raw(raw);
            responses.push(service.hash_update(&mut h, b"guess"));
            assert_eq!(h.raw(), raw);
            let mut h = OperationHandle::from_raw(raw);
            responses.push(service.mac_update(&mut h, b"guess"));
            let mut h = OperationHandle::from_raw(raw);
            responses.push(service.key_derivation_get_capacity(&mut h).map(drop));
        }
        let mut h = OperationHandle::from_raw(u32::MAX);
        responses.push(service.hash_update(&mut h, b"guess"));

        assert!(responses
            .iter()
            .all(|r| *r == Err(CryptoServiceError::BadState)));
        assert_eq!(service.status(), before);
        assert!(service.caller_handles().unwrap().is_empty());
    }

    #[test]
    fn test_error_text_carries_no_detail() {
        let (service, identity, _) = occupied_pool();
        let _caller = identity.bind(NS_CLIENT_B);

        let mut occupied = OperationHandle::from_raw(1);
        let mut free = OperationHandle::from_raw(CAPACITY as u32);
        let mut beyond = OperationHandle::from_raw(CAPACITY as u32 + 1);

        let messages: Vec<String> = [&mut occupied, &mut free, &mut beyond]
            .into_iter()
            .map(|h| service.hash_finish(h).unwrap_err().to_string())
            .collect();
        assert!(messages.windows(2).all(|pair| pair[0] == pair[1]));
    }

    proptest! {
        #[test]
        fn prop_foreign_handle_never_resolves(raw in any::<u32>(), abort in any::<bool>()) {
            let (service, identity, before) = occupied_pool();
            let _caller = identity.bind(NS_CLIENT_B);
            let mut h = OperationHandle::from_raw(raw);

            if abort {
                prop_assert!(service.hash_abort(&mut h).is_ok());
                prop_assert!(service.key_derivation_abort(&mut h).is_ok());
            } else {
                let status = service.hash_update(&mut h, b"x").unwrap_err().status();
                prop_assert_eq!(status, StatusCode::BadState);
            }
            prop_assert_eq!(service.status(), before);
        }
    }
}
