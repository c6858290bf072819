//! # Operation Flows
//!
//! Every family driven through its inbound port from setup to finish,
//! checked against published test vectors where one exists.
//!
//! | Family | Vector |
//! |--------|--------|
//! | Hash | FIPS 180-2 "abc" |
//! | MAC | RFC 4231 test case 2 |
//! | Key derivation | RFC 5869 test case 1 |

#[cfg(test)]
mod tests {
    use shared_types::{OperationHandle, StatusCode};
    use sp_crypto_operations::testing::partitions;
    use sp_crypto_operations::{
        AeadAlgorithm, AeadApi, CipherAlgorithm, CipherApi, CryptoServiceError, DerivationInput,
        HashAlgorithm, HashApi, KeyDerivationAlgorithm, KeyDerivationApi, KeyMaterial,
        MacAlgorithm, MacApi,
    };

    use crate::fixtures::single_caller;

    const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    // =============================================================================
    // HASH
    // =============================================================================

    #[test]
    fn test_hash_chunked_matches_vector() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut handle = OperationHandle::INVALID;

        service.hash_setup(&mut handle, HashAlgorithm::Sha256).unwrap();
        service.hash_update(&mut handle, b"a").unwrap();
        service.hash_update(&mut handle, b"").unwrap();
        service.hash_update(&mut handle, b"bc").unwrap();
        let digest = service.hash_finish(&mut handle).unwrap();

        assert_eq!(hex::encode(digest), SHA256_ABC);
        assert!(!handle.is_valid());
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_hash_million_byte_message() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut handle = OperationHandle::INVALID;
        let chunk = [b'a'; 10_000];

        service.hash_setup(&mut handle, HashAlgorithm::Sha512).unwrap();
        for _ in 0..100 {
            service.hash_update(&mut handle, &chunk).unwrap();
        }
        let digest = service.hash_finish(&mut handle).unwrap();

        assert_eq!(
            hex::encode(digest),
            "e718483d0ce769644e2e42c7bc15b4638e1f98b13b2044285632a803afa973eb\
             de0ff244877ea60a4cb0432ce577c31beb009c5c2c49aa2e4eadb217ad8cc09b"
        );
    }

    #[test]
    fn test_hash_verify_consumes_handle_on_mismatch() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let expected = hex::decode(SHA256_ABC).unwrap();

        let mut handle = OperationHandle::INVALID;
        service.hash_setup(&mut handle, HashAlgorithm::Sha256).unwrap();
        service.hash_update(&mut handle, b"abc").unwrap();
        service.hash_verify(&mut handle, &expected).unwrap();

        let mut handle = OperationHandle::INVALID;
        service.hash_setup(&mut handle, HashAlgorithm::Sha256).unwrap();
        service.hash_update(&mut handle, b"abd").unwrap();
        let err = service.hash_verify(&mut handle, &expected).unwrap_err();

        assert_eq!(err.status(), StatusCode::InvalidSignature);
        assert!(!handle.is_valid());
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_hash_clone_forks_state() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut source = OperationHandle::INVALID;
        let mut fork = OperationHandle::INVALID;

        service.hash_setup(&mut source, HashAlgorithm::Sha256).unwrap();
        service.hash_update(&mut source, b"ab").unwrap();
        service.hash_clone(source, &mut fork).unwrap();
        assert_ne!(source, fork);
        assert_eq!(service.status().in_use, 2);

        service.hash_update(&mut source, b"c").unwrap();
        service.hash_update(&mut fork, b"x").unwrap();

        assert_eq!(hex::encode(service.hash_finish(&mut source).unwrap()), SHA256_ABC);
        assert_ne!(hex::encode(service.hash_finish(&mut fork).unwrap()), SHA256_ABC);
    }

    // =============================================================================
    // MAC
    // =============================================================================

    #[test]
    fn test_mac_sign_matches_rfc4231() {
        let service = single_caller(partitions::SECURE_PARTITION, 4);
        let mut handle = OperationHandle::INVALID;

        service
            .mac_sign_setup(
                &mut handle,
                KeyMaterial::from_slice(b"Jefe"),
                MacAlgorithm::HmacSha256,
            )
            .unwrap();
        service.mac_update(&mut handle, b"what do ya want ").unwrap();
        service.mac_update(&mut handle, b"for nothing?").unwrap();
        let tag = service.mac_sign_finish(&mut handle).unwrap();

        assert_eq!(
            hex::encode(tag),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_mac_key_longer_than_block() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut handle = OperationHandle::INVALID;

        service
            .mac_sign_setup(
                &mut handle,
                KeyMaterial::from_slice(&[0xaa; 131]),
                MacAlgorithm::HmacSha512,
            )
            .unwrap();
        service
            .mac_update(&mut handle, b"Test Using Larger Than Block-Size Key - ")
            .unwrap();
        service.mac_update(&mut handle, b"Hash Key First").unwrap();
        let tag = service.mac_sign_finish(&mut handle).unwrap();

        assert_eq!(
            hex::encode(tag),
            "80b24263c7c1a3ebb71493c1dd7be8b49b46d1f41b4aeec1121b013783f8f352\
             6b56d037e05f2598bd0fd2215d6a1e5295e64f73f63f0aec8b915a985d786598"
        );
    }

    #[test]
    fn test_mac_sign_then_verify() {
        let service = single_caller(partitions::SECURE_PARTITION, 4);
        let key = [0x0bu8; 64];

        let mut handle = OperationHandle::INVALID;
        service
            .mac_sign_setup(&mut handle, KeyMaterial::from_slice(&key), MacAlgorithm::HmacSha512)
            .unwrap();
        service.mac_update(&mut handle, b"firmware image").unwrap();
        let tag = service.mac_sign_finish(&mut handle).unwrap();
        assert_eq!(tag.len(), 64);

        let mut handle = OperationHandle::INVALID;
        service
            .mac_verify_setup(&mut handle, KeyMaterial::from_slice(&key), MacAlgorithm::HmacSha512)
            .unwrap();
        service.mac_update(&mut handle, b"firmware image").unwrap();
        service.mac_verify_finish(&mut handle, &tag).unwrap();

        let mut handle = OperationHandle::INVALID;
        service
            .mac_verify_setup(&mut handle, KeyMaterial::from_slice(&key), MacAlgorithm::HmacSha512)
            .unwrap();
        service.mac_update(&mut handle, b"firmware imagf").unwrap();
        assert_eq!(
            service.mac_verify_finish(&mut handle, &tag).unwrap_err().status(),
            StatusCode::InvalidSignature
        );
        assert!(!handle.is_valid());
    }

    // =============================================================================
    // CIPHER
    // =============================================================================

    #[test]
    fn test_cipher_round_trip_with_generated_iv() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let key = [0x11u8; 32];
        let plaintext = b"stream cipher payload split across updates";

        let mut enc = OperationHandle::INVALID;
        service
            .cipher_encrypt_setup(&mut enc, KeyMaterial::from_slice(&key), CipherAlgorithm::ChaCha20)
            .unwrap();
        let iv = service.cipher_generate_iv(&mut enc).unwrap();
        let mut ciphertext = service.cipher_update(&mut enc, &plaintext[..10]).unwrap();
        ciphertext.extend(service.cipher_update(&mut enc, &plaintext[10..]).unwrap());
        ciphertext.extend(service.cipher_finish(&mut enc).unwrap());
        assert_eq!(ciphertext.len(), plaintext.len());
        assert_ne!(&ciphertext[..], &plaintext[..]);

        let mut dec = OperationHandle::INVALID;
        service
            .cipher_decrypt_setup(&mut dec, KeyMaterial::from_slice(&key), CipherAlgorithm::ChaCha20)
            .unwrap();
        service.cipher_set_iv(&mut dec, &iv).unwrap();
        let mut recovered = service.cipher_update(&mut dec, &ciphertext).unwrap();
        recovered.extend(service.cipher_finish(&mut dec).unwrap());

        assert_eq!(&recovered[..], &plaintext[..]);
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_cipher_update_without_iv_ends_operation() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut handle = OperationHandle::INVALID;
        service
            .cipher_encrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&[0u8; 32]),
                CipherAlgorithm::ChaCha20,
            )
            .unwrap();

        let err = service.cipher_update(&mut handle, b"data").unwrap_err();
        assert_eq!(err.status(), StatusCode::BadState);
        assert!(!handle.is_valid());
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_aes256_ctr_round_trip() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let key = [0x12u8; 32];
        let plaintext = [0xa5u8; 70];

        let mut enc = OperationHandle::INVALID;
        service
            .cipher_encrypt_setup(&mut enc, KeyMaterial::from_slice(&key), CipherAlgorithm::Aes256Ctr)
            .unwrap();
        let iv = service.cipher_generate_iv(&mut enc).unwrap();
        assert_eq!(iv.len(), 16);
        let mut ciphertext = service.cipher_update(&mut enc, &plaintext[..33]).unwrap();
        ciphertext.extend(service.cipher_update(&mut enc, &plaintext[33..]).unwrap());
        service.cipher_finish(&mut enc).unwrap();

        let mut dec = OperationHandle::INVALID;
        service
            .cipher_decrypt_setup(&mut dec, KeyMaterial::from_slice(&key), CipherAlgorithm::Aes256Ctr)
            .unwrap();
        service.cipher_set_iv(&mut dec, &iv).unwrap();
        let recovered = service.cipher_update(&mut dec, &ciphertext).unwrap();
        service.cipher_finish(&mut dec).unwrap();

        assert_eq!(&recovered[..], &plaintext[..]);
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_rejected_cipher_setup_leaves_no_slot() {
        let service = single_caller(partitions::NS_CLIENT_A, 4);
        let mut handle = OperationHandle::INVALID;
        let err = service
            .cipher_encrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&[0u8; 16]),
                CipherAlgorithm::Aes256Ctr,
            )
            .unwrap_err();

        assert_eq!(err.status(), StatusCode::InvalidArgument);
        assert!(!handle.is_valid());
        assert_eq!(service.status().in_use, 0);
        assert_eq!(service.metrics().operations_started, 0);
    }

    // =============================================================================
    // AEAD
    // =============================================================================

    fn seal(algorithm: AeadAlgorithm, key: &[u8], nonce: &[u8], ad: &[u8], pt: &[u8]) -> Vec<u8> {
        let service = single_caller(partitions::NS_CLIENT_B, 2);
        let mut handle = OperationHandle::INVALID;
        service
            .aead_encrypt_setup(&mut handle, KeyMaterial::from_slice(key), algorithm)
            .unwrap();
        service.aead_set_nonce(&mut handle, nonce).unwrap();
        service.aead_update_ad(&mut handle, ad).unwrap();
        let mut out = service.aead_update(&mut handle, pt).unwrap();
        out.extend(service.aead_finish(&mut handle).unwrap());
        out
    }

    #[test]
    fn test_aead_round_trip_both_algorithms() {
        let key = [0x22u8; 32];
        let nonce = [0x33u8; 12];

        for algorithm in [AeadAlgorithm::Aes256Gcm, AeadAlgorithm::ChaCha20Poly1305] {
            let sealed = seal(algorithm, &key, &nonce, b"header", b"secret body");
            assert_eq!(sealed.len(), b"secret body".len() + 16);
            let (ciphertext, tag) = sealed.split_at(sealed.len() - 16);

            let service = single_caller(partitions::NS_CLIENT_B, 2);
            let mut handle = OperationHandle::INVALID;
            service
                .aead_decrypt_setup(&mut handle, KeyMaterial::from_slice(&key), algorithm)
                .unwrap();
            service.aead_set_nonce(&mut handle, &nonce).unwrap();
            service.aead_update_ad(&mut handle, b"head").unwrap();
            service.aead_update_ad(&mut handle, b"er").unwrap();
            let mut plaintext = service.aead_update(&mut handle, ciphertext).unwrap();
            plaintext.extend(service.aead_verify(&mut handle, tag).unwrap());

            assert_eq!(plaintext, b"secret body".to_vec());
        }
    }

    #[test]
    fn test_aead_rejects_tampered_associated_data() {
        let key = [0x44u8; 32];
        let nonce = [0x55u8; 12];
        let sealed = seal(AeadAlgorithm::Aes256Gcm, &key, &nonce, b"v1", b"payload");
        let (ciphertext, tag) = sealed.split_at(sealed.len() - 16);

        let service = single_caller(partitions::NS_CLIENT_B, 2);
        let mut handle = OperationHandle::INVALID;
        service
            .aead_decrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&key),
                AeadAlgorithm::Aes256Gcm,
            )
            .unwrap();
        service.aead_set_nonce(&mut handle, &nonce).unwrap();
        service.aead_update_ad(&mut handle, b"v2").unwrap();
        service.aead_update(&mut handle, ciphertext).unwrap();

        let err = service.aead_verify(&mut handle, tag).unwrap_err();
        assert_eq!(err.status(), StatusCode::InvalidSignature);
        assert!(!handle.is_valid());
        assert_eq!(service.status().in_use, 0);
    }

    #[test]
    fn test_aead_generated_nonce_round_trip() {
        let key = [0x66u8; 32];
        let service = single_caller(partitions::NS_CLIENT_B, 2);

        let mut handle = OperationHandle::INVALID;
        service
            .aead_encrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&key),
                AeadAlgorithm::ChaCha20Poly1305,
            )
            .unwrap();
        let nonce = service.aead_generate_nonce(&mut handle).unwrap();
        assert_eq!(nonce.len(), AeadAlgorithm::ChaCha20Poly1305.nonce_len());
        let mut sealed = service.aead_update(&mut handle, b"fresh nonce").unwrap();
        sealed.extend(service.aead_finish(&mut handle).unwrap());
        let (ciphertext, tag) = sealed.split_at(sealed.len() - 16);

        service
            .aead_decrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&key),
                AeadAlgorithm::ChaCha20Poly1305,
            )
            .unwrap();
        assert_eq!(
            service.aead_generate_nonce(&mut handle).unwrap_err().status(),
            StatusCode::BadState
        );
        assert!(!handle.is_valid());

        service
            .aead_decrypt_setup(
                &mut handle,
                KeyMaterial::from_slice(&key),
                AeadAlgorithm::ChaCha20Poly1305,
            )
            .unwrap();
        service.aead_set_nonce(&mut handle, &nonce).unwrap();
        let mut plaintext = service.aead_update(&mut handle, ciphertext).unwrap();
        plaintext.extend(service.aead_verify(&mut handle, tag).unwrap());
        assert_eq!(plaintext, b"fresh nonce".to_vec());
        assert_eq!(service.status().in_use, 0);
    }

    // =============================================================================
    // KEY DERIVATION
    // =============================================================================

    #[test]
    fn test_hkdf_matches_rfc5869() {
        let service = single_caller(partitions::SECURE_PARTITION, 2);
        let salt = hex::decode("000102030405060708090a0b0c").unwrap();
        let info = hex::decode("f0f1f2f3f4f5f6f7f8f9").unwrap();
        let mut handle = OperationHandle::INVALID;

        service
            .key_derivation_setup(&mut handle, KeyDerivationAlgorithm::HkdfSha256)
            .unwrap();
        service
            .key_derivation_input_bytes(&mut handle, DerivationInput::Salt, &salt)
            .unwrap();
        service
            .key_derivation_input_bytes(&mut handle, DerivationInput::Secret, &[0x0b; 22])
            .unwrap();
        service
            .key_derivation_input_bytes(&mut handle, DerivationInput::Info, &info)
            .unwrap();
        service.key_derivation_set_capacity(&mut handle, 42).unwrap();

        let mut okm = service.key_derivation_output_bytes(&mut handle, 16).unwrap().to_vec();
        okm.extend_from_slice(&service.key_derivation_output_bytes(&mut handle, 26).unwrap());
        assert_eq!(service.key_derivation_get_capacity(&mut handle).unwrap(), 0);
        service.key_derivation_finish(&mut handle).unwrap();

        assert_eq!(
            hex::encode(okm),
            "3cb25f25faacd57a90434f64d0362f2a2d2d0a90cf1a5a4c5db02d56ecc4c5bf34007208d5b887185865"
        );
    }

    #[test]
    fn test_derivation_output_beyond_capacity_ends_operation() {
        let service = single_caller(partitions::SECURE_PARTITION, 2);
        let mut handle = OperationHandle::INVALID;

        service
            .key_derivation_setup(&mut handle, KeyDerivationAlgorithm::DeviceSecret)
            .unwrap();
        service
            .key_derivation_input_bytes(&mut handle, DerivationInput::Label, b"boot")
            .unwrap();
        service.key_derivation_set_capacity(&mut handle, 8).unwrap();

        let err = service.key_derivation_output_bytes(&mut handle, 9).unwrap_err();
        assert_eq!(err.status(), StatusCode::InsufficientData);
        assert!(!handle.is_valid());
        assert_eq!(
            service.key_derivation_get_capacity(&mut handle),
            Err(CryptoServiceError::BadState)
        );
    }

    #[test]
    fn test_abort_is_idempotent() {
        let service = single_caller(partitions::NS_CLIENT_A, 2);
        let mut handle = OperationHandle::INVALID;
        service
            .key_derivation_setup(&mut handle, KeyDerivationAlgorithm::HkdfSha256)
            .unwrap();

        service.key_derivation_abort(&mut handle).unwrap();
        assert!(!handle.is_valid());
        service.key_derivation_abort(&mut handle).unwrap();
        service.aead_abort(&mut handle).unwrap();

        let metrics = service.metrics();
        assert_eq!(metrics.operations_started, 1);
        assert_eq!(metrics.operations_aborted, 1);
        assert_eq!(metrics.outstanding_upper_bound(), 0);
    }
}
