//! # Value Objects
//!
//! Read-only snapshots of pool state.

use serde::{Deserialize, Serialize};

use super::entities::OperationKind;

/// Live operations per kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCounts {
    /// Cipher operations.
    pub cipher: usize,
    /// MAC operations.
    pub mac: usize,
    /// Hash operations.
    pub hash: usize,
    /// Key derivations.
    pub key_derivation: usize,
    /// AEAD operations.
    pub aead: usize,
}

impl KindCounts {
    pub(crate) fn record(&mut self, kind: OperationKind) {
        match kind {
            OperationKind::None => {}
            OperationKind::Cipher => self.cipher += 1,
            OperationKind::Mac => self.mac += 1,
            OperationKind::Hash => self.hash += 1,
            OperationKind::KeyDerivation => self.key_derivation += 1,
            OperationKind::Aead => self.aead += 1,
        }
    }

    /// Count for `kind`.
    pub fn get(&self, kind: OperationKind) -> usize {
        match kind {
            OperationKind::None => 0,
            OperationKind::Cipher => self.cipher,
            OperationKind::Mac => self.mac,
            OperationKind::Hash => self.hash,
            OperationKind::KeyDerivation => self.key_derivation,
            OperationKind::Aead => self.aead,
        }
    }
}

/// Pool occupancy snapshot.
///
/// Never includes owners or handles; safe to expose to any caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Total slots.
    pub capacity: usize,
    /// Slots in use.
    pub in_use: usize,
    /// Free slots.
    pub available: usize,
    /// Live operations per kind.
    pub by_kind: KindCounts,
}
