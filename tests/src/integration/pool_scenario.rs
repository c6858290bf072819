//! # Pool Scenario
//!
//! Slot reuse across partitions and kinds on a two-slot pool, first
//! directly on [`OperationPool`](sp_crypto_operations::OperationPool) and
//! then through the service ports.

#[cfg(test)]
mod tests {
    use shared_types::{OperationHandle, StatusCode};
    use sp_crypto_operations::testing::partitions::{NS_CLIENT_A, NS_CLIENT_B};
    use sp_crypto_operations::{
        CryptoServiceError, HashAlgorithm, HashApi, KeyMaterial, MacAlgorithm, MacApi,
        OperationKind, OperationPool, Wipe,
    };

    use crate::fixtures::dispatched;

    #[test]
    fn test_two_slot_pool_reuse() {
        let mut pool = OperationPool::new(2).unwrap();

        let mut first = OperationHandle::INVALID;
        pool.allocate(OperationKind::Hash, NS_CLIENT_A, &mut first).unwrap();
        assert_eq!(first.raw(), 1);

        let mut second = OperationHandle::INVALID;
        pool.allocate(OperationKind::Hash, NS_CLIENT_B, &mut second).unwrap();
        assert_eq!(second.raw(), 2);

        let mut third = OperationHandle::INVALID;
        assert_eq!(
            pool.allocate(OperationKind::Hash, NS_CLIENT_A, &mut third).unwrap_err(),
            CryptoServiceError::PoolExhausted { capacity: 2 }
        );
        assert!(!third.is_valid());

        let stale = first;
        pool.release(&mut first, Wipe::Zeroize).unwrap();
        assert!(!first.is_valid());

        let mut reused = OperationHandle::INVALID;
        pool.allocate(OperationKind::Mac, NS_CLIENT_A, &mut reused).unwrap();
        assert_eq!(reused, stale);
        assert_eq!(pool.slot(reused).unwrap().kind(), OperationKind::Mac);

        assert_eq!(
            pool.lookup(OperationKind::Hash, stale, NS_CLIENT_A).unwrap_err(),
            CryptoServiceError::BadState
        );
        assert!(pool.lookup(OperationKind::Mac, stale, NS_CLIENT_A).is_ok());
    }

    #[test]
    fn test_two_slot_service_reuse() {
        let (service, identity) = dispatched(2);

        let mut a_hash = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_A);
            service.hash_setup(&mut a_hash, HashAlgorithm::Sha256).unwrap();
        }
        let mut b_hash = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_B);
            service.hash_setup(&mut b_hash, HashAlgorithm::Sha256).unwrap();
        }

        let _caller = identity.bind(NS_CLIENT_A);
        let mut extra = OperationHandle::INVALID;
        let err = service.hash_setup(&mut extra, HashAlgorithm::Sha256).unwrap_err();
        assert_eq!(err.status(), StatusCode::InsufficientMemory);

        let stale = a_hash;
        service.hash_abort(&mut a_hash).unwrap();

        let mut mac = OperationHandle::INVALID;
        service
            .mac_sign_setup(&mut mac, KeyMaterial::from_slice(b"k"), MacAlgorithm::HmacSha256)
            .unwrap();
        assert_eq!(mac, stale);

        let mut as_hash = stale;
        assert_eq!(
            service.hash_update(&mut as_hash, b"x"),
            Err(CryptoServiceError::BadState)
        );
        assert_eq!(service.status().in_use, 2);
        assert_eq!(service.metrics().pool_exhaustions, 1);
    }
}
