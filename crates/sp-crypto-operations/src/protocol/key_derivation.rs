//! # Key Derivation Delegates
//!
//! Key derivation is the one family whose calls do not all go to the crypto
//! backend. The algorithm named at setup selects a delegate, and the choice
//! is stored in the slot's [`KeyDerivationContext`]. Every later call
//! dispatches on that stored tag.
//!
//! | Delegate | Selected by | Runs on |
//! |----------|-------------|---------|
//! | Backend | any backend algorithm | [`CryptoBackend<BackendDerivationFamily>`] |
//! | Device secret | [`KeyDerivationAlgorithm::DeviceSecret`] | [`DeviceSecretProvider`] |
//!
//! A device-secret derivation records its owner at setup and prefixes the
//! caller's label with that owner before it reaches the provider. Two
//! partitions choosing the same label therefore never obtain the same bytes.

use shared_types::PartitionId;
use std::sync::Arc;
use zeroize::{Zeroize, Zeroizing};

use crate::domain::{
    BackendDerivationContext, BackendDerivationFamily, BackendError, DerivationInput,
    DerivationOutput, DerivationStep, DeviceSecretDerivation, KeyDerivationAlgorithm,
    KeyDerivationContext, KeyDerivationFamily, KeyDerivationSetup, MAX_DERIVATION_LABEL,
};
use crate::ports::{CryptoBackend, DeviceSecretProvider};

/// Routes key-derivation calls to the delegate chosen at setup.
pub struct KeyDerivationDelegates<B, S> {
    backend: Arc<B>,
    device_secret: Arc<S>,
}

impl<B, S> KeyDerivationDelegates<B, S> {
    /// Creates the dispatcher.
    pub fn new(backend: Arc<B>, device_secret: Arc<S>) -> Self {
        Self {
            backend,
            device_secret,
        }
    }
}

fn backend_workspace(
    context: &mut KeyDerivationContext,
) -> Result<&mut BackendDerivationContext, BackendError> {
    match context {
        KeyDerivationContext::Backend(workspace) => Ok(workspace),
        KeyDerivationContext::DeviceSecret(_) => Err(BackendError::BadState),
    }
}

impl<B, S> CryptoBackend<KeyDerivationFamily> for KeyDerivationDelegates<B, S>
where
    B: CryptoBackend<BackendDerivationFamily>,
    S: DeviceSecretProvider,
{
    fn setup(
        &self,
        context: &mut KeyDerivationContext,
        owner: PartitionId,
        request: KeyDerivationSetup,
    ) -> Result<(), BackendError> {
        match request.algorithm {
            KeyDerivationAlgorithm::DeviceSecret => {
                *context =
                    KeyDerivationContext::DeviceSecret(DeviceSecretDerivation::bound_to(owner));
                Ok(())
            }
            KeyDerivationAlgorithm::HkdfSha256 => {
                self.backend.setup(backend_workspace(context)?, owner, request)
            }
        }
    }

    fn update(
        &self,
        context: &mut KeyDerivationContext,
        step: DerivationStep<'_>,
    ) -> Result<DerivationOutput, BackendError> {
        match context {
            KeyDerivationContext::Backend(workspace) => self.backend.update(workspace, step),
            KeyDerivationContext::DeviceSecret(state) => {
                device_secret_step(state, &*self.device_secret, step)
            }
        }
    }

    fn finish(
        &self,
        context: &mut KeyDerivationContext,
        request: (),
    ) -> Result<(), BackendError> {
        match context {
            KeyDerivationContext::Backend(workspace) => self.backend.finish(workspace, request),
            KeyDerivationContext::DeviceSecret(state) => {
                state.zeroize();
                Ok(())
            }
        }
    }

    fn abort(&self, context: &mut KeyDerivationContext) -> Result<(), BackendError> {
        match context {
            KeyDerivationContext::Backend(workspace) => self.backend.abort(workspace),
            KeyDerivationContext::DeviceSecret(state) => {
                state.zeroize();
                Ok(())
            }
        }
    }
}

/// One step of a device-secret derivation.
pub(crate) fn device_secret_step<S: DeviceSecretProvider + ?Sized>(
    state: &mut DeviceSecretDerivation,
    secret: &S,
    step: DerivationStep<'_>,
) -> Result<DerivationOutput, BackendError> {
    match step {
        DerivationStep::Input {
            step: DerivationInput::Label,
            data,
        } => {
            if state.has_label() {
                return Err(BackendError::BadState);
            }
            if data.is_empty() || data.len() > MAX_DERIVATION_LABEL {
                return Err(BackendError::InvalidArgument);
            }
            state.store_label(data);
            Ok(DerivationOutput::Accepted)
        }
        DerivationStep::Input { .. } => Err(BackendError::InvalidArgument),
        DerivationStep::SetCapacity(remaining) => {
            if remaining > state.remaining() {
                return Err(BackendError::InvalidArgument);
            }
            state.set_capacity(state.produced() + remaining);
            Ok(DerivationOutput::Accepted)
        }
        DerivationStep::GetCapacity => Ok(DerivationOutput::Capacity(state.remaining())),
        DerivationStep::Output(len) => {
            let label = state.bound_label().ok_or(BackendError::BadState)?;
            if len > state.remaining() {
                return Err(BackendError::InsufficientData);
            }
            let produced = state.produced();
            let mut stream = Zeroizing::new(vec![0u8; produced + len]);
            secret.derive(label, &mut stream)?;
            let output = Zeroizing::new(stream[produced..].to_vec());
            state.advance(len);
            Ok(DerivationOutput::Bytes(output))
        }
    }
}
