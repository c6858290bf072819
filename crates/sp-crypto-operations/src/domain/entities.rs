//! # Domain Entities
//!
//! Operation kinds, algorithm identifiers and resolved key material.
//!
//! Algorithm identifiers carry stable one-byte tags so that backends can
//! persist them inside an opaque context.

use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// OPERATION KIND
// =============================================================================

/// Protocol family a slot is bound to.
///
/// `None` marks a free slot and is never accepted by allocate or lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// Free slot.
    #[default]
    None,
    /// Streaming symmetric cipher.
    Cipher,
    /// Message authentication code.
    Mac,
    /// Message digest.
    Hash,
    /// Key derivation.
    KeyDerivation,
    /// Authenticated encryption with associated data.
    Aead,
}

impl OperationKind {
    /// Every kind that can own a slot.
    pub const ALL: [OperationKind; 5] = [
        OperationKind::Cipher,
        OperationKind::Mac,
        OperationKind::Hash,
        OperationKind::KeyDerivation,
        OperationKind::Aead,
    ];

    /// Short lowercase name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::None => "none",
            OperationKind::Cipher => "cipher",
            OperationKind::Mac => "mac",
            OperationKind::Hash => "hash",
            OperationKind::KeyDerivation => "key_derivation",
            OperationKind::Aead => "aead",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// ALGORITHMS
// =============================================================================

macro_rules! algorithm_tags {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl $name {
            /// Stable tag persisted in context bytes.
            pub const fn tag(self) -> u8 {
                self as u8
            }

            /// Decodes a tag written by [`Self::tag`].
            pub fn from_tag(tag: u8) -> Option<Self> {
                match tag {
                    $(t if t == $name::$variant as u8 => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

/// Digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum HashAlgorithm {
    /// SHA-224.
    Sha224 = 1,
    /// SHA-256.
    Sha256 = 2,
    /// SHA-384.
    Sha384 = 3,
    /// SHA-512.
    Sha512 = 4,
}

algorithm_tags!(HashAlgorithm { Sha224, Sha256, Sha384, Sha512 });

impl HashAlgorithm {
    /// Digest length in bytes.
    pub const fn digest_len(self) -> usize {
        match self {
            HashAlgorithm::Sha224 => 28,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }
}

/// MAC algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MacAlgorithm {
    /// HMAC over SHA-256.
    HmacSha256 = 1,
    /// HMAC over SHA-512.
    HmacSha512 = 2,
}

algorithm_tags!(MacAlgorithm { HmacSha256, HmacSha512 });

impl MacAlgorithm {
    /// Full tag length in bytes.
    pub const fn tag_len(self) -> usize {
        match self {
            MacAlgorithm::HmacSha256 => 32,
            MacAlgorithm::HmacSha512 => 64,
        }
    }
}

/// Unauthenticated stream cipher algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipherAlgorithm {
    /// ChaCha20 with a 96-bit nonce.
    ChaCha20 = 1,
    /// AES-256 in counter mode.
    Aes256Ctr = 2,
}

algorithm_tags!(CipherAlgorithm { ChaCha20, Aes256Ctr });

impl CipherAlgorithm {
    /// IV length in bytes.
    pub const fn iv_len(self) -> usize {
        match self {
            CipherAlgorithm::ChaCha20 => 12,
            CipherAlgorithm::Aes256Ctr => 16,
        }
    }
}

/// AEAD algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum AeadAlgorithm {
    /// AES-256-GCM.
    Aes256Gcm = 1,
    /// ChaCha20-Poly1305.
    ChaCha20Poly1305 = 2,
}

algorithm_tags!(AeadAlgorithm { Aes256Gcm, ChaCha20Poly1305 });

impl AeadAlgorithm {
    /// Nonce length in bytes.
    pub const fn nonce_len(self) -> usize {
        12
    }

    /// Authentication tag length in bytes.
    pub const fn tag_len(self) -> usize {
        16
    }
}

/// Key derivation algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum KeyDerivationAlgorithm {
    /// HKDF over SHA-256, run by the crypto backend.
    HkdfSha256 = 1,
    /// Derivation from the device-unique secret, bound to the caller.
    DeviceSecret = 2,
}

algorithm_tags!(KeyDerivationAlgorithm { HkdfSha256, DeviceSecret });

/// Direction of a cipher or AEAD operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum CipherDirection {
    /// Plaintext in, ciphertext out.
    Encrypt = 1,
    /// Ciphertext in, plaintext out.
    Decrypt = 2,
}

algorithm_tags!(CipherDirection { Encrypt, Decrypt });

/// Direction of a MAC operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MacDirection {
    /// Produce a tag.
    Sign = 1,
    /// Compare against an expected tag.
    Verify = 2,
}

algorithm_tags!(MacDirection { Sign, Verify });

/// Input slot of a key derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DerivationInput {
    /// Input keying material.
    Secret,
    /// Optional extraction salt.
    Salt,
    /// Context and application info.
    Info,
    /// Caller-chosen label for device-secret derivation.
    Label,
}

// =============================================================================
// KEY MATERIAL
// =============================================================================

/// Resolved key bytes handed to a setup call.
///
/// Zeroized on drop and never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial {
    bytes: Vec<u8>,
}

impl KeyMaterial {
    /// Takes ownership of `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Copies `bytes` into new key material.
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// Key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyMaterial({} bytes, ***)", self.bytes.len())
    }
}
