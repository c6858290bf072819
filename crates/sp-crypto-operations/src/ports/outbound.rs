//! Outbound (Driven) ports for the crypto operation service.
//!
//! The service never implements a primitive itself. All algorithmic work is
//! delegated to a [`CryptoBackend`] that operates on the opaque workspace of
//! a slot, and device-bound derivations to a [`DeviceSecretProvider`].

use shared_types::PartitionId;
use std::sync::Arc;

use crate::domain::{
    AeadFamily, BackendDerivationFamily, BackendError, CipherFamily, HashFamily, MacFamily,
    OperationFamily,
};

/// Backend for one protocol family.
///
/// Every method receives the family's workspace of the slot being driven.
/// The backend must keep all per-operation state inside that workspace.
pub trait CryptoBackend<F: OperationFamily>: Send + Sync {
    /// Initialises a freshly zeroed workspace.
    ///
    /// `owner` is the partition the operation is bound to; backends that do
    /// not bind material to callers ignore it. On failure the workspace is
    /// zeroized and the slot freed by the caller.
    fn setup(
        &self,
        context: &mut F::Context,
        owner: PartitionId,
        request: F::SetupRequest,
    ) -> Result<(), BackendError>;

    /// Runs one update step.
    fn update(&self, context: &mut F::Context, step: F::Step<'_>)
        -> Result<F::StepOutput, BackendError>;

    /// Completes the operation.
    fn finish(
        &self,
        context: &mut F::Context,
        request: F::FinishRequest<'_>,
    ) -> Result<F::FinishOutput, BackendError>;

    /// Discards the operation's state.
    fn abort(&self, context: &mut F::Context) -> Result<(), BackendError>;
}

impl<F, B> CryptoBackend<F> for Arc<B>
where
    F: OperationFamily,
    B: CryptoBackend<F> + ?Sized,
{
    fn setup(
        &self,
        context: &mut F::Context,
        owner: PartitionId,
        request: F::SetupRequest,
    ) -> Result<(), BackendError> {
        (**self).setup(context, owner, request)
    }

    fn update(
        &self,
        context: &mut F::Context,
        step: F::Step<'_>,
    ) -> Result<F::StepOutput, BackendError> {
        (**self).update(context, step)
    }

    fn finish(
        &self,
        context: &mut F::Context,
        request: F::FinishRequest<'_>,
    ) -> Result<F::FinishOutput, BackendError> {
        (**self).finish(context, request)
    }

    fn abort(&self, context: &mut F::Context) -> Result<(), BackendError> {
        (**self).abort(context)
    }
}

/// A backend serving every family the service exposes.
///
/// Blanket-implemented; never implement it by hand.
pub trait CryptoBackendSuite:
    CryptoBackend<CipherFamily>
    + CryptoBackend<HashFamily>
    + CryptoBackend<MacFamily>
    + CryptoBackend<AeadFamily>
    + CryptoBackend<BackendDerivationFamily>
    + 'static
{
}

impl<T> CryptoBackendSuite for T where
    T: CryptoBackend<CipherFamily>
        + CryptoBackend<HashFamily>
        + CryptoBackend<MacFamily>
        + CryptoBackend<AeadFamily>
        + CryptoBackend<BackendDerivationFamily>
        + 'static
{
}

/// Access to the device-unique secret.
///
/// The secret itself never leaves the provider.
pub trait DeviceSecretProvider: Send + Sync {
    /// Fills `output` with material derived from the secret and `label`.
    ///
    /// Must be deterministic: the same label always yields the same bytes,
    /// and a shorter output is a prefix of a longer one.
    fn derive(&self, label: &[u8], output: &mut [u8]) -> Result<(), BackendError>;
}

impl<S: DeviceSecretProvider + ?Sized> DeviceSecretProvider for Arc<S> {
    fn derive(&self, label: &[u8], output: &mut [u8]) -> Result<(), BackendError> {
        (**self).derive(label, output)
    }
}
