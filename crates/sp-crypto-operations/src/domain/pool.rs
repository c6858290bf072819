//! # Operation Pool
//!
//! Fixed-capacity table of operation slots shared by all caller partitions.
//!
//! ## Invariants Enforced
//!
//! - At most `capacity` operations are live at once (`allocate()`).
//! - A slot's owner and kind never change between allocate and release.
//! - A handle resolves only for the kind and owner it was issued to, and
//!   every other case fails with the same `BadState` (`lookup()`).
//! - Only `allocate()` marks a slot in use; only `release()` frees it.
//! - Released payloads are zeroized on request, and all payloads are
//!   zeroized when the pool is dropped.
//!
//! The pool holds no lock of its own. Callers wrap it in one mutex per pool
//! instance and hold that mutex for the whole protocol call.

use shared_types::{OperationHandle, PartitionId};
use zeroize::Zeroize;

use super::context::BackendContext;
use super::entities::OperationKind;
use super::errors::CryptoServiceError;
use super::families::OperationFamily;
use super::invariants::{
    invariant_bindable_kind, invariant_bindable_owner, invariant_capacity,
    invariant_handle_unassigned, invariant_slot_resolves,
};
use super::value_objects::{KindCounts, PoolStatus};

/// Default number of concurrently live operations.
pub const DEFAULT_POOL_CAPACITY: usize = 8;

/// Largest supported pool.
pub const MAX_POOL_CAPACITY: usize = 64;

/// Whether `release` zeroizes the payload before freeing the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wipe {
    /// Zero the payload of the recorded kind.
    Zeroize,
    /// Leave the payload bytes as they are.
    Skip,
}

/// One entry of the pool.
#[derive(Debug, Default)]
pub struct OperationSlot {
    in_use: bool,
    owner: PartitionId,
    kind: OperationKind,
    context: BackendContext,
}

impl OperationSlot {
    /// Whether the slot is bound to a live operation.
    pub fn is_in_use(&self) -> bool {
        self.in_use
    }

    /// Owner recorded at allocation; `PartitionId::NONE` when free.
    pub fn owner(&self) -> PartitionId {
        self.owner
    }

    /// Kind recorded at allocation; `OperationKind::None` when free.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Payload, for diagnostics. Never hand this to a caller.
    pub fn context(&self) -> &BackendContext {
        &self.context
    }
}

/// Fixed-capacity operation-context pool.
#[derive(Debug)]
pub struct OperationPool {
    slots: Vec<OperationSlot>,
}

impl OperationPool {
    /// Creates a pool of `capacity` free slots.
    pub fn new(capacity: usize) -> Result<Self, CryptoServiceError> {
        invariant_capacity(capacity)?;
        let slots = (0..capacity).map(|_| OperationSlot::default()).collect();
        Ok(Self { slots })
    }

    /// Creates a pool of [`DEFAULT_POOL_CAPACITY`] slots.
    pub fn with_defaults() -> Self {
        Self {
            slots: (0..DEFAULT_POOL_CAPACITY)
                .map(|_| OperationSlot::default())
                .collect(),
        }
    }

    /// Total number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of live operations.
    pub fn in_use(&self) -> usize {
        self.slots.iter().filter(|slot| slot.in_use).count()
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.capacity() - self.in_use()
    }

    /// Whether every slot is taken.
    pub fn is_full(&self) -> bool {
        self.available() == 0
    }

    /// Binds the first free slot to `kind` and `owner`.
    ///
    /// `handle` must be [`OperationHandle::INVALID`]; on success it names the
    /// new slot. The payload is reset to a zeroed workspace of `kind`. On
    /// failure neither the pool nor `handle` changes.
    pub fn allocate(
        &mut self,
        kind: OperationKind,
        owner: PartitionId,
        handle: &mut OperationHandle,
    ) -> Result<&mut BackendContext, CryptoServiceError> {
        invariant_handle_unassigned(*handle)?;
        invariant_bindable_kind(kind)?;
        invariant_bindable_owner(owner)?;

        let capacity = self.capacity();
        let index = self
            .slots
            .iter()
            .position(|slot| !slot.in_use)
            .ok_or(CryptoServiceError::PoolExhausted { capacity })?;
        let issued = OperationHandle::from_slot_index(index)
            .ok_or(CryptoServiceError::PoolExhausted { capacity })?;

        let slot = &mut self.slots[index];
        slot.in_use = true;
        slot.owner = owner;
        slot.kind = kind;
        slot.context = BackendContext::zeroed(kind);
        *handle = issued;

        Ok(&mut slot.context)
    }

    /// [`allocate`](Self::allocate) returning the family's typed payload.
    pub fn allocate_family<F: OperationFamily>(
        &mut self,
        owner: PartitionId,
        handle: &mut OperationHandle,
    ) -> Result<&mut F::Context, CryptoServiceError> {
        let context = self.allocate(F::KIND, owner, handle)?;
        F::project(context).ok_or(CryptoServiceError::BadState)
    }

    /// Resolves `handle` for a caller.
    ///
    /// Fails with `BadState` if the handle is invalid or out of range, or
    /// names a free slot, a slot of another kind or a slot of another owner.
    /// The error is the same in every case.
    pub fn lookup(
        &mut self,
        kind: OperationKind,
        handle: OperationHandle,
        owner: PartitionId,
    ) -> Result<&mut BackendContext, CryptoServiceError> {
        let slot = handle
            .slot_index()
            .and_then(|index| self.slots.get_mut(index))
            .ok_or(CryptoServiceError::BadState)?;
        if !invariant_slot_resolves(slot, kind, owner) {
            return Err(CryptoServiceError::BadState);
        }
        Ok(&mut slot.context)
    }

    /// [`lookup`](Self::lookup) returning the family's typed payload.
    pub fn lookup_family<F: OperationFamily>(
        &mut self,
        handle: OperationHandle,
        owner: PartitionId,
    ) -> Result<&mut F::Context, CryptoServiceError> {
        let context = self.lookup(F::KIND, handle, owner)?;
        F::project(context).ok_or(CryptoServiceError::BadState)
    }

    /// Frees the slot named by `handle` and resets `handle`.
    ///
    /// Does not check ownership; callers resolve the handle with
    /// [`lookup`](Self::lookup) first. Releasing a free slot is a no-op
    /// that leaves `handle` untouched.
    pub fn release(
        &mut self,
        handle: &mut OperationHandle,
        wipe: Wipe,
    ) -> Result<(), CryptoServiceError> {
        let slot = handle
            .slot_index()
            .and_then(|index| self.slots.get_mut(index))
            .ok_or(CryptoServiceError::InvalidArgument("handle out of range"))?;
        if !slot.in_use {
            return Ok(());
        }

        if wipe == Wipe::Zeroize {
            slot.context.zeroize();
        }
        slot.owner = PartitionId::NONE;
        slot.kind = OperationKind::None;
        slot.in_use = false;
        *handle = OperationHandle::INVALID;
        Ok(())
    }

    /// Handles of every live operation owned by `owner`.
    pub fn live_handles(&self, owner: PartitionId) -> Vec<OperationHandle> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.in_use && slot.owner == owner)
            .filter_map(|(index, _)| OperationHandle::from_slot_index(index))
            .collect()
    }

    /// Releases every operation owned by `owner`, zeroizing each payload.
    ///
    /// Returns the number of operations released.
    pub fn release_all_owned_by(&mut self, owner: PartitionId) -> usize {
        let mut released = 0;
        for mut handle in self.live_handles(owner) {
            if self.release(&mut handle, Wipe::Zeroize).is_ok() {
                released += 1;
            }
        }
        released
    }

    /// Occupancy snapshot.
    pub fn status(&self) -> PoolStatus {
        let mut by_kind = KindCounts::default();
        for slot in self.slots.iter().filter(|slot| slot.in_use) {
            by_kind.record(slot.kind);
        }
        let in_use = self.in_use();
        PoolStatus {
            capacity: self.capacity(),
            in_use,
            available: self.capacity() - in_use,
            by_kind,
        }
    }

    /// Read-only view of the slot a handle encodes, live or not.
    pub fn slot(&self, handle: OperationHandle) -> Option<&OperationSlot> {
        handle.slot_index().and_then(|index| self.slots.get(index))
    }
}

impl Default for OperationPool {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Drop for OperationPool {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            slot.context.zeroize();
        }
    }
}
