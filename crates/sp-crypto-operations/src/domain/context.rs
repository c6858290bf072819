//! # Backend Contexts
//!
//! Fixed-size workspaces a backend keeps its per-operation state in.
//!
//! | Payload | Bytes |
//! |---------|-------|
//! | Cipher | 128 |
//! | Hash | 1024 |
//! | MAC | 1024 |
//! | AEAD | 1536 |
//! | Key derivation (backend) | 256 |
//!
//! A slot's payload is the tagged variant matching the kind it was
//! allocated for. Payload bytes are secret: they may hold keys, partial
//! digests or derivation inputs, so `Debug` never prints them and every
//! payload can be zeroized in place.

use shared_types::PartitionId;
use std::fmt;
use zeroize::Zeroize;

use super::entities::OperationKind;

/// Cipher workspace size.
pub const CIPHER_CONTEXT_SIZE: usize = 128;
/// Hash workspace size.
pub const HASH_CONTEXT_SIZE: usize = 1024;
/// MAC workspace size.
pub const MAC_CONTEXT_SIZE: usize = 1024;
/// AEAD workspace size.
pub const AEAD_CONTEXT_SIZE: usize = 1536;
/// Backend key-derivation workspace size.
pub const KEY_DERIVATION_CONTEXT_SIZE: usize = 256;

/// Longest label accepted by a device-secret derivation.
pub const MAX_DERIVATION_LABEL: usize = 64;

/// Output bound of a device-secret derivation (HKDF-SHA256 limit).
pub const DEVICE_SECRET_MAX_OUTPUT: usize = 255 * 32;

const BINDING_PREFIX_LEN: usize = 4;

// =============================================================================
// OPAQUE PAYLOAD
// =============================================================================

/// Zeroizable byte workspace of `N` bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct OpaqueContext<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> OpaqueContext<N> {
    /// Workspace size in bytes.
    pub const SIZE: usize = N;

    /// All-zero workspace.
    pub const fn zeroed() -> Self {
        Self { bytes: [0u8; N] }
    }

    /// Workspace bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Mutable workspace bytes.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Whether every byte is zero.
    pub fn is_zeroed(&self) -> bool {
        self.bytes.iter().all(|b| *b == 0)
    }

    /// Overwrites this workspace with a copy of `other`.
    pub fn copy_from(&mut self, other: &Self) {
        self.bytes.copy_from_slice(&other.bytes);
    }
}

impl<const N: usize> Default for OpaqueContext<N> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> Zeroize for OpaqueContext<N> {
    fn zeroize(&mut self) {
        self.bytes.zeroize();
    }
}

impl<const N: usize> AsRef<[u8]> for OpaqueContext<N> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<const N: usize> AsMut<[u8]> for OpaqueContext<N> {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl<const N: usize> fmt::Debug for OpaqueContext<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OpaqueContext<{}>(***)", N)
    }
}

/// Cipher payload.
pub type CipherContext = OpaqueContext<CIPHER_CONTEXT_SIZE>;
/// Hash payload.
pub type HashContext = OpaqueContext<HASH_CONTEXT_SIZE>;
/// MAC payload.
pub type MacContext = OpaqueContext<MAC_CONTEXT_SIZE>;
/// AEAD payload.
pub type AeadContext = OpaqueContext<AEAD_CONTEXT_SIZE>;
/// Payload of a derivation run by the crypto backend.
pub type BackendDerivationContext = OpaqueContext<KEY_DERIVATION_CONTEXT_SIZE>;

// =============================================================================
// DEVICE-SECRET DERIVATION STATE
// =============================================================================

/// State of a derivation from the device-unique secret.
///
/// The owner is captured at setup. The stored label is always prefixed with
/// the owner's little-endian id, so two partitions supplying the same label
/// derive unrelated material.
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceSecretDerivation {
    owner: PartitionId,
    bound_label: [u8; BINDING_PREFIX_LEN + MAX_DERIVATION_LABEL],
    bound_label_len: usize,
    capacity: usize,
    produced: usize,
}

impl DeviceSecretDerivation {
    /// Fresh derivation bound to `owner`, with no label and full capacity.
    pub fn bound_to(owner: PartitionId) -> Self {
        Self {
            owner,
            bound_label: [0u8; BINDING_PREFIX_LEN + MAX_DERIVATION_LABEL],
            bound_label_len: 0,
            capacity: DEVICE_SECRET_MAX_OUTPUT,
            produced: 0,
        }
    }

    /// Partition recorded at setup.
    pub fn owner(&self) -> PartitionId {
        self.owner
    }

    /// Whether a label has been accepted.
    pub fn has_label(&self) -> bool {
        self.bound_label_len > 0
    }

    /// Owner prefix followed by the caller's label, once a label is set.
    pub fn bound_label(&self) -> Option<&[u8]> {
        self.has_label()
            .then(|| &self.bound_label[..self.bound_label_len])
    }

    /// Stores `owner ‖ label`. The caller checks the length and ordering rules.
    pub(crate) fn store_label(&mut self, label: &[u8]) {
        let end = BINDING_PREFIX_LEN + label.len();
        self.bound_label[..BINDING_PREFIX_LEN].copy_from_slice(&self.owner.to_le_bytes());
        self.bound_label[BINDING_PREFIX_LEN..end].copy_from_slice(label);
        self.bound_label_len = end;
    }

    /// Bytes still available for output.
    pub fn remaining(&self) -> usize {
        self.capacity - self.produced
    }

    /// Total output allowed, including bytes already produced.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes produced so far.
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub(crate) fn advance(&mut self, len: usize) {
        self.produced += len;
    }

    /// Whether the state carries no owner, label or counters.
    pub fn is_zeroed(&self) -> bool {
        self.owner == PartitionId::NONE
            && self.bound_label.iter().all(|b| *b == 0)
            && self.bound_label_len == 0
            && self.capacity == 0
            && self.produced == 0
    }
}

impl Zeroize for DeviceSecretDerivation {
    fn zeroize(&mut self) {
        self.owner = PartitionId::NONE;
        self.bound_label.zeroize();
        self.bound_label_len.zeroize();
        self.capacity.zeroize();
        self.produced.zeroize();
    }
}

impl fmt::Debug for DeviceSecretDerivation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSecretDerivation")
            .field("owner", &self.owner)
            .field("has_label", &self.has_label())
            .field("capacity", &self.capacity)
            .field("produced", &self.produced)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TAGGED PAYLOADS
// =============================================================================

/// Key-derivation payload, tagged with the delegate chosen at setup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyDerivationContext {
    /// Derivation run by the crypto backend.
    Backend(BackendDerivationContext),
    /// Derivation from the device-unique secret.
    DeviceSecret(DeviceSecretDerivation),
}

impl KeyDerivationContext {
    /// Whether the active delegate's state is all zero.
    pub fn is_zeroed(&self) -> bool {
        match self {
            KeyDerivationContext::Backend(ctx) => ctx.is_zeroed(),
            KeyDerivationContext::DeviceSecret(state) => state.is_zeroed(),
        }
    }
}

impl Default for KeyDerivationContext {
    fn default() -> Self {
        KeyDerivationContext::Backend(BackendDerivationContext::zeroed())
    }
}

impl Zeroize for KeyDerivationContext {
    fn zeroize(&mut self) {
        match self {
            KeyDerivationContext::Backend(ctx) => ctx.zeroize(),
            KeyDerivationContext::DeviceSecret(state) => state.zeroize(),
        }
    }
}

/// Payload held by an operation slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum BackendContext {
    /// Never allocated.
    #[default]
    None,
    /// Cipher workspace.
    Cipher(CipherContext),
    /// MAC workspace.
    Mac(MacContext),
    /// Hash workspace.
    Hash(HashContext),
    /// Key-derivation state.
    KeyDerivation(KeyDerivationContext),
    /// AEAD workspace.
    Aead(AeadContext),
}

impl BackendContext {
    /// Zero-initialised payload for `kind`.
    pub fn zeroed(kind: OperationKind) -> Self {
        match kind {
            OperationKind::None => BackendContext::None,
            OperationKind::Cipher => BackendContext::Cipher(CipherContext::zeroed()),
            OperationKind::Mac => BackendContext::Mac(MacContext::zeroed()),
            OperationKind::Hash => BackendContext::Hash(HashContext::zeroed()),
            OperationKind::KeyDerivation => {
                BackendContext::KeyDerivation(KeyDerivationContext::default())
            }
            OperationKind::Aead => BackendContext::Aead(AeadContext::zeroed()),
        }
    }

    /// Kind of the payload currently held.
    pub fn kind(&self) -> OperationKind {
        match self {
            BackendContext::None => OperationKind::None,
            BackendContext::Cipher(_) => OperationKind::Cipher,
            BackendContext::Mac(_) => OperationKind::Mac,
            BackendContext::Hash(_) => OperationKind::Hash,
            BackendContext::KeyDerivation(_) => OperationKind::KeyDerivation,
            BackendContext::Aead(_) => OperationKind::Aead,
        }
    }

    /// Whether the payload holds no residual state.
    pub fn is_zeroed(&self) -> bool {
        match self {
            BackendContext::None => true,
            BackendContext::Cipher(ctx) => ctx.is_zeroed(),
            BackendContext::Mac(ctx) => ctx.is_zeroed(),
            BackendContext::Hash(ctx) => ctx.is_zeroed(),
            BackendContext::KeyDerivation(ctx) => ctx.is_zeroed(),
            BackendContext::Aead(ctx) => ctx.is_zeroed(),
        }
    }
}

impl Zeroize for BackendContext {
    fn zeroize(&mut self) {
        match self {
            BackendContext::None => {}
            BackendContext::Cipher(ctx) => ctx.zeroize(),
            BackendContext::Mac(ctx) => ctx.zeroize(),
            BackendContext::Hash(ctx) => ctx.zeroize(),
            BackendContext::KeyDerivation(ctx) => ctx.zeroize(),
            BackendContext::Aead(ctx) => ctx.zeroize(),
        }
    }
}
