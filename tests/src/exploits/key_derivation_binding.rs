//! # Key Derivation Binding
//!
//! **Attack:** partition B requests a device-secret derivation with the
//! label partition A uses for its storage key, hoping to obtain A's key.
//!
//! **Defense:** the label reaching the device secret is prefixed with the
//! owner recorded at setup, so equal labels from different partitions
//! select unrelated output streams.

#[cfg(test)]
mod tests {
    use shared_types::{OperationHandle, PartitionId, StatusCode};
    use sp_crypto_operations::testing::partitions::{NS_CLIENT_A, NS_CLIENT_B, SECURE_PARTITION};
    use sp_crypto_operations::{
        DerivationInput, DeviceSecretProvider, KeyDerivationAlgorithm, KeyDerivationApi,
        StaticDeviceSecret,
    };
    use zeroize::Zeroizing;

    use crate::fixtures::{dispatched, DispatchedService, DEVICE_SECRET};
    use shared_types::DispatchedCaller;

    const LABEL: &[u8] = b"storage-key";

    fn derive(
        service: &DispatchedService,
        identity: &DispatchedCaller,
        owner: PartitionId,
        label: &[u8],
        chunks: &[usize],
    ) -> Vec<u8> {
        let _caller = identity.bind(owner);
        let mut handle = OperationHandle::INVALID;
        service
            .key_derivation_setup(&mut handle, KeyDerivationAlgorithm::DeviceSecret)
            .unwrap();
        service
            .key_derivation_input_bytes(&mut handle, DerivationInput::Label, label)
            .unwrap();

        let mut out = Vec::new();
        for &len in chunks {
            out.extend_from_slice(&service.key_derivation_output_bytes(&mut handle, len).unwrap());
        }
        service.key_derivation_finish(&mut handle).unwrap();
        out
    }

    fn expected(owner: PartitionId, label: &[u8], len: usize) -> Vec<u8> {
        let mut bound = owner.to_le_bytes().to_vec();
        bound.extend_from_slice(label);
        let mut out = Zeroizing::new(vec![0u8; len]);
        StaticDeviceSecret::new(DEVICE_SECRET)
            .derive(&bound, &mut out[..])
            .unwrap();
        out.to_vec()
    }

    #[test]
    fn test_same_label_different_partitions() {
        let (service, identity) = dispatched(4);

        let alice = derive(&service, &identity, NS_CLIENT_A, LABEL, &[32]);
        let bob = derive(&service, &identity, NS_CLIENT_B, LABEL, &[32]);

        assert_ne!(alice, bob);
        assert_eq!(alice, expected(NS_CLIENT_A, LABEL, 32));
        assert_eq!(bob, expected(NS_CLIENT_B, LABEL, 32));
    }

    #[test]
    fn test_unprefixed_label_is_never_served() {
        let (service, identity) = dispatched(4);
        let served = derive(&service, &identity, SECURE_PARTITION, LABEL, &[32]);

        let mut raw = Zeroizing::new(vec![0u8; 32]);
        StaticDeviceSecret::new(DEVICE_SECRET).derive(LABEL, &mut raw[..]).unwrap();
        assert_ne!(served, raw.to_vec());
    }

    #[test]
    fn test_label_forging_owner_prefix_fails() {
        // B embeds A's id in its own label; the real prefix still differs.
        let (service, identity) = dispatched(4);
        let mut forged = NS_CLIENT_A.to_le_bytes().to_vec();
        forged.extend_from_slice(LABEL);

        let alice = derive(&service, &identity, NS_CLIENT_A, LABEL, &[32]);
        let bob = derive(&service, &identity, NS_CLIENT_B, &forged, &[32]);
        assert_ne!(alice, bob);
    }

    #[test]
    fn test_stream_is_deterministic_and_chunk_independent() {
        let (service, identity) = dispatched(4);
        let whole = derive(&service, &identity, NS_CLIENT_A, LABEL, &[48]);
        let parts = derive(&service, &identity, NS_CLIENT_A, LABEL, &[5, 11, 32]);
        assert_eq!(whole, parts);
    }

    #[test]
    fn test_derivation_state_is_not_transferable() {
        let (service, identity) = dispatched(4);
        let mut handle = OperationHandle::INVALID;
        {
            let _caller = identity.bind(NS_CLIENT_A);
            service
                .key_derivation_setup(&mut handle, KeyDerivationAlgorithm::DeviceSecret)
                .unwrap();
            service
                .key_derivation_input_bytes(&mut handle, DerivationInput::Label, LABEL)
                .unwrap();
        }

        let _caller = identity.bind(NS_CLIENT_B);
        let mut stolen = handle;
        let err = service.key_derivation_output_bytes(&mut stolen, 32).unwrap_err();
        assert_eq!(err.status(), StatusCode::BadState);
        assert_eq!(service.status().in_use, 1);
    }
}
