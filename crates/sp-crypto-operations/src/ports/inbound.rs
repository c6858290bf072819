//! Inbound (Driving) ports for the crypto operation service.
//!
//! One trait per protocol family. Every call is made on behalf of the caller
//! the dispatcher reports; no method takes an owner argument.
//!
//! Setup methods write the new handle into `handle`, which must be
//! [`OperationHandle::INVALID`] on entry. Every call that ends an operation
//! (finish, verify, abort, or an update the backend rejects) resets it.

use shared_types::OperationHandle;
use zeroize::Zeroizing;

use crate::domain::{
    AeadAlgorithm, CipherAlgorithm, CryptoServiceError, DerivationInput, HashAlgorithm,
    KeyDerivationAlgorithm, KeyMaterial, MacAlgorithm,
};

/// Multipart streaming cipher.
pub trait CipherApi: Send + Sync {
    /// Starts an encryption.
    fn cipher_encrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: CipherAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Starts a decryption.
    fn cipher_decrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: CipherAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Generates and installs a random IV, returning it.
    fn cipher_generate_iv(&self, handle: &mut OperationHandle)
        -> Result<Vec<u8>, CryptoServiceError>;

    /// Installs a caller-chosen IV.
    fn cipher_set_iv(&self, handle: &mut OperationHandle, iv: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Processes a chunk of input.
    fn cipher_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError>;

    /// Completes the operation and returns any trailing output.
    fn cipher_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError>;

    /// Abandons the operation.
    fn cipher_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError>;
}

/// Multipart message digest.
pub trait HashApi: Send + Sync {
    /// Starts a digest.
    fn hash_setup(
        &self,
        handle: &mut OperationHandle,
        algorithm: HashAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Absorbs input.
    fn hash_update(&self, handle: &mut OperationHandle, input: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Returns the digest.
    fn hash_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError>;

    /// Compares the digest with `expected`.
    fn hash_verify(&self, handle: &mut OperationHandle, expected: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Copies a live digest into a new operation owned by the same caller.
    fn hash_clone(
        &self,
        source: OperationHandle,
        target: &mut OperationHandle,
    ) -> Result<(), CryptoServiceError>;

    /// Abandons the operation.
    fn hash_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError>;
}

/// Multipart message authentication.
pub trait MacApi: Send + Sync {
    /// Starts computing a tag.
    fn mac_sign_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: MacAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Starts checking a tag.
    fn mac_verify_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: MacAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Absorbs input.
    fn mac_update(&self, handle: &mut OperationHandle, input: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Returns the tag.
    fn mac_sign_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError>;

    /// Compares the tag with `expected` in constant time.
    fn mac_verify_finish(
        &self,
        handle: &mut OperationHandle,
        expected: &[u8],
    ) -> Result<(), CryptoServiceError>;

    /// Abandons the operation.
    fn mac_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError>;
}

/// Multipart authenticated encryption.
pub trait AeadApi: Send + Sync {
    /// Starts sealing a message.
    fn aead_encrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: AeadAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Starts opening a message.
    fn aead_decrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: AeadAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Generates and installs a random nonce, returning it. Sealing only.
    fn aead_generate_nonce(&self, handle: &mut OperationHandle)
        -> Result<Vec<u8>, CryptoServiceError>;

    /// Installs a caller-chosen nonce.
    fn aead_set_nonce(&self, handle: &mut OperationHandle, nonce: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Absorbs additional authenticated data.
    fn aead_update_ad(&self, handle: &mut OperationHandle, data: &[u8])
        -> Result<(), CryptoServiceError>;

    /// Absorbs payload data, returning any output produced so far.
    fn aead_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError>;

    /// Seals: returns the remaining ciphertext followed by the tag.
    fn aead_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError>;

    /// Opens: checks `tag` and returns the plaintext.
    fn aead_verify(
        &self,
        handle: &mut OperationHandle,
        tag: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError>;

    /// Abandons the operation.
    fn aead_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError>;
}

/// Multipart key derivation.
pub trait KeyDerivationApi: Send + Sync {
    /// Starts a derivation.
    fn key_derivation_setup(
        &self,
        handle: &mut OperationHandle,
        algorithm: KeyDerivationAlgorithm,
    ) -> Result<(), CryptoServiceError>;

    /// Provides one input.
    fn key_derivation_input_bytes(
        &self,
        handle: &mut OperationHandle,
        step: DerivationInput,
        data: &[u8],
    ) -> Result<(), CryptoServiceError>;

    /// Lowers the total output capacity.
    fn key_derivation_set_capacity(
        &self,
        handle: &mut OperationHandle,
        capacity: usize,
    ) -> Result<(), CryptoServiceError>;

    /// Remaining output capacity.
    fn key_derivation_get_capacity(
        &self,
        handle: &mut OperationHandle,
    ) -> Result<usize, CryptoServiceError>;

    /// Produces the next `len` bytes of output.
    fn key_derivation_output_bytes(
        &self,
        handle: &mut OperationHandle,
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoServiceError>;

    /// Ends a derivation that produced everything it needed.
    fn key_derivation_finish(&self, handle: &mut OperationHandle)
        -> Result<(), CryptoServiceError>;

    /// Abandons the derivation.
    fn key_derivation_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError>;
}
