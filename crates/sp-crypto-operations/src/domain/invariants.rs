//! # Domain Invariants
//!
//! Rules the operation pool enforces on every call.

use shared_types::{OperationHandle, PartitionId};

use super::entities::OperationKind;
use super::errors::CryptoServiceError;
use super::pool::{OperationSlot, MAX_POOL_CAPACITY};

/// Invariant: capacity is within `1..=MAX_POOL_CAPACITY`.
///
/// Every index below the capacity must be encodable as a non-zero handle.
pub fn invariant_capacity(capacity: usize) -> Result<(), CryptoServiceError> {
    if capacity == 0 || capacity > MAX_POOL_CAPACITY {
        return Err(CryptoServiceError::InvalidArgument(
            "pool capacity out of range",
        ));
    }
    Ok(())
}

/// Invariant: a new operation starts from the invalid handle.
///
/// A caller passing a live handle to setup would otherwise lose track of it.
pub fn invariant_handle_unassigned(handle: OperationHandle) -> Result<(), CryptoServiceError> {
    if handle.is_valid() {
        return Err(CryptoServiceError::BadState);
    }
    Ok(())
}

/// Invariant: slots are only bound to a real kind.
pub fn invariant_bindable_kind(kind: OperationKind) -> Result<(), CryptoServiceError> {
    if kind == OperationKind::None {
        return Err(CryptoServiceError::InvalidArgument(
            "operation kind must not be None",
        ));
    }
    Ok(())
}

/// Invariant: slots are only bound to a real caller.
///
/// The reserved id marks free slots and would make them resolvable.
pub fn invariant_bindable_owner(owner: PartitionId) -> Result<(), CryptoServiceError> {
    if owner == PartitionId::NONE {
        return Err(CryptoServiceError::InvalidArgument(
            "owner must not be the reserved partition id",
        ));
    }
    Ok(())
}

/// Invariant: a slot resolves only for the kind and owner it was bound to.
pub fn invariant_slot_resolves(
    slot: &OperationSlot,
    kind: OperationKind,
    owner: PartitionId,
) -> bool {
    slot.is_in_use() && slot.kind() == kind && slot.owner() == owner
}
