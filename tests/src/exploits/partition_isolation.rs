//! # Partition Isolation
//!
//! **Attack:** partition B learns the handle of an operation owned by
//! partition A (a leaked log line, a shared buffer) and replays it against
//! every port.
//!
//! **Defense:** lookup requires owner and kind to match; every mismatch is
//! the same `BadState`, and abort of a foreign handle is a silent no-op.

#[cfg(test)]
mod tests {
    use shared_types::{OperationHandle, StatusCode};
    use sp_crypto_operations::testing::partitions::{NS_CLIENT_A, NS_CLIENT_B};
    use sp_crypto_operations::{
        AeadAlgorithm, AeadApi, CipherAlgorithm, CipherApi, CryptoServiceError, HashAlgorithm,
        HashApi, KeyDerivationApi, KeyMaterial, MacAlgorithm, MacApi,
    };

    use crate::fixtures::dispatched;

    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_replayed_handle_rejected_on_every_port() {
        let (service, identity) = dispatched(4);
        let mut victim = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_A);
            service.hash_setup(&mut victim, HashAlgorithm::Sha256).unwrap();
            service.hash_update(&mut victim, b"ab").unwrap();
        }

        let _caller = identity.bind(NS_CLIENT_B);
        let mut h = victim;
        let key = || KeyMaterial::from_slice(&[0u8; 32]);

        let results: Vec<StatusCode> = vec![
            service.hash_update(&mut h, b"evil").unwrap_err().status(),
            service.hash_finish(&mut h).unwrap_err().status(),
            service.hash_verify(&mut h, &[0u8; 32]).unwrap_err().status(),
            service.mac_update(&mut h, b"evil").unwrap_err().status(),
            service.mac_sign_finish(&mut h).unwrap_err().status(),
            service.cipher_update(&mut h, b"evil").unwrap_err().status(),
            service.cipher_generate_iv(&mut h).unwrap_err().status(),
            service.aead_generate_nonce(&mut h).unwrap_err().status(),
            service.aead_set_nonce(&mut h, &[0u8; 12]).unwrap_err().status(),
            service.aead_update_ad(&mut h, b"evil").unwrap_err().status(),
            service.aead_finish(&mut h).unwrap_err().status(),
            service.key_derivation_get_capacity(&mut h).unwrap_err().status(),
            service.key_derivation_output_bytes(&mut h, 16).unwrap_err().status(),
        ];
        assert!(results.iter().all(|status| *status == StatusCode::BadState));
        assert_eq!(h, victim, "rejected calls must not touch the handle");

        // Setup never overwrites a handle that still names a slot.
        assert_eq!(
            service
                .cipher_encrypt_setup(&mut h, key(), CipherAlgorithm::ChaCha20)
                .unwrap_err()
                .status(),
            StatusCode::BadState
        );

        // Cloning someone else's hash state.
        let mut fork = OperationHandle::INVALID;
        assert_eq!(
            service.hash_clone(victim, &mut fork),
            Err(CryptoServiceError::BadState)
        );
        assert!(!fork.is_valid());

        // Foreign aborts succeed without effect.
        service.hash_abort(&mut h).unwrap();
        service.aead_abort(&mut h).unwrap();
        assert_eq!(service.status().in_use, 1);
        drop(_caller);

        let _caller = identity.bind(NS_CLIENT_A);
        service.hash_update(&mut victim, b"c").unwrap();
        assert_eq!(hex::encode(service.hash_finish(&mut victim).unwrap()), SHA256_ABC);
    }

    #[test]
    fn test_foreign_failure_does_not_terminate_victim() {
        let (service, identity) = dispatched(4);
        let key = [0x77u8; 32];

        let mut victim = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_A);
            service
                .aead_encrypt_setup(
                    &mut victim,
                    KeyMaterial::from_slice(&key),
                    AeadAlgorithm::ChaCha20Poly1305,
                )
                .unwrap();
            service.aead_set_nonce(&mut victim, &[0x01u8; 12]).unwrap();
            service.aead_update(&mut victim, b"confidential").unwrap();
        }
        {
            // A verify on an encrypt operation would end it, if it resolved.
            let _caller = identity.bind(NS_CLIENT_B);
            let mut h = victim;
            assert_eq!(
                service.aead_verify(&mut h, &[0u8; 16]),
                Err(CryptoServiceError::BadState)
            );
        }

        let _caller = identity.bind(NS_CLIENT_A);
        let sealed = service.aead_finish(&mut victim).unwrap();
        assert_eq!(sealed.len(), b"confidential".len() + 16);
    }

    #[test]
    fn test_reset_partition_spares_others() {
        let (service, identity) = dispatched(4);
        let mut kept = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_A);
            service
                .mac_sign_setup(&mut kept, KeyMaterial::from_slice(b"k"), MacAlgorithm::HmacSha256)
                .unwrap();
        }
        {
            let _caller = identity.bind(NS_CLIENT_B);
            for _ in 0..3 {
                let mut h = OperationHandle::INVALID;
                service.hash_setup(&mut h, HashAlgorithm::Sha512).unwrap();
            }
        }

        assert_eq!(service.reset_partition(NS_CLIENT_B), 3);
        assert_eq!(service.status().in_use, 1);

        let _caller = identity.bind(NS_CLIENT_A);
        assert_eq!(service.caller_handles().unwrap(), vec![kept]);
        service.mac_update(&mut kept, b"still mine").unwrap();
        assert_eq!(service.mac_sign_finish(&mut kept).unwrap().len(), 32);
    }
}
