//! # Core Entities
//!
//! Identity and handle types shared by every crate in the workspace.
//!
//! ## Clusters
//!
//! - **Callers**: `PartitionId`
//! - **Operations**: `OperationHandle`

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CLUSTER A: CALLERS
// =============================================================================

/// Stable identifier of a caller partition.
///
/// Negative values identify non-secure clients, positive values identify
/// secure partitions. Zero is reserved and never names a live caller; it is
/// the owner recorded in free operation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PartitionId(pub i32);

impl PartitionId {
    /// Owner value of a slot that nobody holds.
    pub const NONE: PartitionId = PartitionId(0);

    /// Raw identifier.
    pub fn get(self) -> i32 {
        self.0
    }

    /// Whether the caller lives in the non-secure world.
    pub fn is_non_secure(self) -> bool {
        self.0 < 0
    }

    /// Little-endian encoding used when an identity is bound into derived material.
    pub fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl Default for PartitionId {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_non_secure() {
            write!(f, "ns:{}", self.0)
        } else {
            write!(f, "sp:{}", self.0)
        }
    }
}

// =============================================================================
// CLUSTER B: OPERATIONS
// =============================================================================

/// Opaque capability naming a live operation context.
///
/// Zero is always invalid. Any other value encodes `slot_index + 1`, but a
/// handle only resolves together with the kind and owner recorded when it
/// was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct OperationHandle(u32);

impl OperationHandle {
    /// The reserved invalid handle.
    pub const INVALID: OperationHandle = OperationHandle(0);

    /// Wraps a raw handle value received from a caller.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Handle that names the slot at `index`.
    ///
    /// Returns `None` when the index cannot be encoded.
    pub fn from_slot_index(index: usize) -> Option<Self> {
        let raw = u32::try_from(index).ok()?.checked_add(1)?;
        Some(Self(raw))
    }

    /// Raw value as exchanged with callers.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Whether this handle is not the reserved invalid value.
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Slot index this handle encodes, if any.
    pub fn slot_index(self) -> Option<usize> {
        self.0.checked_sub(1).map(|i| i as usize)
    }

    /// Resets the handle to the invalid value and returns the previous one.
    pub fn take(&mut self) -> OperationHandle {
        std::mem::replace(self, Self::INVALID)
    }
}

impl fmt::Display for OperationHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
