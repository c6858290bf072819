//! # Operation Protocol
//!
//! The `setup → update* → finish | abort` state machine shared by every
//! family, written once over [`OperationFamily`].
//!
//! ```text
//! Idle ──setup──▶ Active ──update*──▶ Active ──finish──▶ Finished
//!   ▲               │                    │
//!   │          backend fails        abort / backend fails
//!   └── slot wiped ─┘                    └──────────────▶ Aborted
//! ```
//!
//! | Phase | Pool failure | Backend failure | Release |
//! |-------|--------------|-----------------|---------|
//! | setup | propagated, nothing held | slot zeroized and freed | only on failure |
//! | update | propagated, nothing released | slot freed | only on failure |
//! | finish | propagated, nothing released | propagated | always |
//! | abort | success, no effect | reported after release | always |
//!
//! The pool mutex is held for the whole call, so the backend runs on a
//! context no other call can reach.

pub mod key_derivation;

pub use key_derivation::KeyDerivationDelegates;

use parking_lot::Mutex;
use shared_types::{OperationHandle, PartitionId};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::domain::{CryptoServiceError, HashFamily, OperationFamily, OperationPool, Wipe};
use crate::ports::CryptoBackend;

/// Pool shared by every protocol of one service instance.
pub type SharedPool = Arc<Mutex<OperationPool>>;

/// Protocol state machine for family `F` driven by backend `B`.
pub struct OperationProtocol<F, B> {
    pool: SharedPool,
    backend: Arc<B>,
    terminal_wipe: Wipe,
    _family: PhantomData<fn() -> F>,
}

impl<F, B> OperationProtocol<F, B>
where
    F: OperationFamily,
    B: CryptoBackend<F>,
{
    /// Creates a protocol over `pool` and `backend`.
    ///
    /// Slots released by update failure, finish and abort are not wiped.
    pub fn new(pool: SharedPool, backend: Arc<B>) -> Self {
        Self {
            pool,
            backend,
            terminal_wipe: Wipe::Skip,
            _family: PhantomData,
        }
    }

    /// Also zeroizes slots released by update failure, finish and abort.
    pub fn with_terminal_wipe(mut self, wipe: Wipe) -> Self {
        self.terminal_wipe = wipe;
        self
    }

    /// The backend driving this family.
    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    /// Allocates a slot for `owner` and initialises it.
    ///
    /// A failed setup leaves no trace: the slot is zeroized, freed, and
    /// `handle` is invalid again.
    pub fn setup(
        &self,
        owner: PartitionId,
        handle: &mut OperationHandle,
        request: F::SetupRequest,
    ) -> Result<(), CryptoServiceError> {
        let mut pool = self.pool.lock();
        let context = pool.allocate_family::<F>(owner, handle)?;
        if let Err(err) = self.backend.setup(context, owner, request) {
            pool.release(handle, Wipe::Zeroize)?;
            return Err(err.into());
        }
        Ok(())
    }

    /// Runs one update step.
    ///
    /// A backend failure terminates the operation.
    pub fn update(
        &self,
        handle: &mut OperationHandle,
        owner: PartitionId,
        step: F::Step<'_>,
    ) -> Result<F::StepOutput, CryptoServiceError> {
        let mut pool = self.pool.lock();
        let context = pool.lookup_family::<F>(*handle, owner)?;
        match self.backend.update(context, step) {
            Ok(output) => Ok(output),
            Err(err) => {
                pool.release(handle, self.terminal_wipe)?;
                Err(err.into())
            }
        }
    }

    /// Completes the operation. The slot is released whatever the outcome.
    pub fn finish(
        &self,
        handle: &mut OperationHandle,
        owner: PartitionId,
        request: F::FinishRequest<'_>,
    ) -> Result<F::FinishOutput, CryptoServiceError> {
        let mut pool = self.pool.lock();
        let context = pool.lookup_family::<F>(*handle, owner)?;
        let result = self.backend.finish(context, request);
        pool.release(handle, self.terminal_wipe)?;
        result.map_err(Into::into)
    }

    /// Abandons the operation.
    ///
    /// A handle that does not resolve for `owner` is left alone and the call
    /// succeeds, so cleanup paths can abort unconditionally.
    pub fn abort(
        &self,
        handle: &mut OperationHandle,
        owner: PartitionId,
    ) -> Result<(), CryptoServiceError> {
        let mut pool = self.pool.lock();
        let context = match pool.lookup_family::<F>(*handle, owner) {
            Ok(context) => context,
            Err(_) => return Ok(()),
        };
        let result = self.backend.abort(context);
        pool.release(handle, self.terminal_wipe)?;
        result.map_err(Into::into)
    }
}

impl<B> OperationProtocol<HashFamily, B>
where
    B: CryptoBackend<HashFamily>,
{
    /// Starts a new hash for `owner` from the state of `source`.
    ///
    /// `target` must be invalid on entry and stays invalid on failure.
    pub fn clone_operation(
        &self,
        source: OperationHandle,
        owner: PartitionId,
        target: &mut OperationHandle,
    ) -> Result<(), CryptoServiceError> {
        let mut pool = self.pool.lock();
        let snapshot = zeroize::Zeroizing::new(
            pool.lookup_family::<HashFamily>(source, owner)?.clone(),
        );
        let copy = pool.allocate_family::<HashFamily>(owner, target)?;
        copy.copy_from(&snapshot);
        Ok(())
    }
}
