//! # Static Device Secret
//!
//! [`DeviceSecretProvider`] over a 32-byte secret held in memory, for hosts
//! without a hardware unique key.
//!
//! ## Security
//!
//! The secret is zeroized on drop and never printed. Derivation is
//! HKDF-SHA256 with a fixed domain-separation salt and the label as info,
//! so outputs are deterministic and a shorter output is always a prefix of
//! a longer one.

use hkdf::Hkdf;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use std::fmt;
use zeroize::Zeroizing;

use crate::domain::{BackendError, DEVICE_SECRET_MAX_OUTPUT};
use crate::ports::DeviceSecretProvider;

const DERIVATION_SALT: &[u8] = b"sp-crypto-operations/device-secret/v1";

/// Device-unique secret kept in process memory.
pub struct StaticDeviceSecret {
    secret: Zeroizing<[u8; 32]>,
}

impl StaticDeviceSecret {
    /// Wraps an existing secret.
    pub fn new(secret: [u8; 32]) -> Self {
        Self {
            secret: Zeroizing::new(secret),
        }
    }

    /// Fresh random secret from the OS RNG.
    pub fn generate() -> Self {
        let mut secret = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut secret[..]);
        Self { secret }
    }
}

impl DeviceSecretProvider for StaticDeviceSecret {
    fn derive(&self, label: &[u8], output: &mut [u8]) -> Result<(), BackendError> {
        if label.is_empty() {
            return Err(BackendError::InvalidArgument);
        }
        if output.len() > DEVICE_SECRET_MAX_OUTPUT {
            return Err(BackendError::InsufficientData);
        }
        Hkdf::<Sha256>::new(Some(DERIVATION_SALT), &self.secret[..])
            .expand(label, output)
            .map_err(|_| BackendError::InsufficientData)
    }
}

impl fmt::Debug for StaticDeviceSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print the actual secret
        f.write_str("StaticDeviceSecret(***)")
    }
}
