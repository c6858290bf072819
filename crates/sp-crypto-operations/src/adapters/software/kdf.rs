//! HKDF-SHA256.
//!
//! Inputs arrive in the order salt (optional), secret, info. The salt is kept
//! in the buffer prefix until the secret arrives; the secret is extracted on
//! arrival and only the 32-byte pseudorandom key is kept, so it may be any
//! length. Salt and info share the 144-byte buffer. Output is one stream of up
//! to 8160 bytes; each output step expands everything produced so far and
//! returns the new tail.

use hkdf::Hkdf;
use sha2::Sha256;
use shared_types::PartitionId;
use zeroize::{Zeroize, Zeroizing};

use super::layout::{self, Workspace};
use super::SoftwareBackend;
use crate::domain::{
    BackendDerivationContext, BackendDerivationFamily, BackendError, DerivationInput,
    DerivationOutput, DerivationStep, KeyDerivationAlgorithm, KeyDerivationSetup,
    DEVICE_SECRET_MAX_OUTPUT,
};
use crate::ports::CryptoBackend;

const SALT: u8 = 0b0001;
const SECRET: u8 = 0b0010;
const INFO: u8 = 0b0100;
const OUTPUT: u8 = 0b1000;

const HKDF_SHA256_MAX_OUTPUT: u64 = DEVICE_SECRET_MAX_OUTPUT as u64;

fn remaining(workspace: &Workspace<'_>) -> u64 {
    workspace.limit().saturating_sub(workspace.counter())
}

fn accept_input(
    workspace: &mut Workspace<'_>,
    input: DerivationInput,
    data: &[u8],
) -> Result<(), BackendError> {
    if workspace.has_flag(OUTPUT) {
        return Err(BackendError::BadState);
    }
    match input {
        DerivationInput::Salt => {
            if workspace.has_flag(SALT) || workspace.has_flag(SECRET) {
                return Err(BackendError::BadState);
            }
            workspace.append_prefix(data)?;
            workspace.set_flag(SALT);
        }
        DerivationInput::Secret => {
            if workspace.has_flag(SECRET) {
                return Err(BackendError::BadState);
            }
            if data.is_empty() {
                return Err(BackendError::InvalidArgument);
            }
            let salt = workspace.has_flag(SALT).then(|| workspace.prefix());
            let (mut prk, _) = Hkdf::<Sha256>::extract(salt, data);
            let stored = workspace.set_key(&prk);
            prk.as_mut_slice().zeroize();
            stored?;
            workspace.set_flag(SECRET);
        }
        DerivationInput::Info => {
            if !workspace.has_flag(SECRET) || workspace.has_flag(INFO) {
                return Err(BackendError::BadState);
            }
            workspace.append_data(data)?;
            workspace.set_flag(INFO);
        }
        DerivationInput::Label => return Err(BackendError::InvalidArgument),
    }
    Ok(())
}

fn produce(workspace: &mut Workspace<'_>, len: usize) -> Result<DerivationOutput, BackendError> {
    if !workspace.has_flag(SECRET) || !workspace.has_flag(INFO) {
        return Err(BackendError::BadState);
    }
    if len as u64 > remaining(workspace) {
        return Err(BackendError::InsufficientData);
    }

    let produced = workspace.counter() as usize;
    let hkdf = Hkdf::<Sha256>::from_prk(workspace.key()).map_err(|_| BackendError::BadState)?;
    let mut stream = Zeroizing::new(vec![0u8; produced + len]);
    hkdf.expand(workspace.data(), &mut stream)
        .map_err(|_| BackendError::InsufficientData)?;

    workspace.set_counter((produced + len) as u64);
    workspace.set_flag(OUTPUT);
    Ok(DerivationOutput::Bytes(Zeroizing::new(stream[produced..].to_vec())))
}

impl CryptoBackend<BackendDerivationFamily> for SoftwareBackend {
    fn setup(
        &self,
        context: &mut BackendDerivationContext,
        _owner: PartitionId,
        request: KeyDerivationSetup,
    ) -> Result<(), BackendError> {
        if request.algorithm != KeyDerivationAlgorithm::HkdfSha256 {
            return Err(BackendError::NotSupported);
        }
        let mut workspace = Workspace::new(context.as_bytes_mut())?;
        workspace.set_limit(HKDF_SHA256_MAX_OUTPUT);
        workspace.activate(request.algorithm.tag(), 0);
        Ok(())
    }

    fn update(
        &self,
        context: &mut BackendDerivationContext,
        step: DerivationStep<'_>,
    ) -> Result<DerivationOutput, BackendError> {
        layout::update_step(context.as_bytes_mut(), |workspace| match step {
            DerivationStep::Input { step, data } => {
                accept_input(workspace, step, data)?;
                Ok(DerivationOutput::Accepted)
            }
            DerivationStep::SetCapacity(capacity) => {
                if capacity as u64 > remaining(workspace) {
                    return Err(BackendError::InvalidArgument);
                }
                workspace.set_limit(workspace.counter() + capacity as u64);
                Ok(DerivationOutput::Accepted)
            }
            DerivationStep::GetCapacity => {
                Ok(DerivationOutput::Capacity(remaining(workspace) as usize))
            }
            DerivationStep::Output(len) => produce(workspace, len),
        })
    }

    fn finish(
        &self,
        context: &mut BackendDerivationContext,
        _request: (),
    ) -> Result<(), BackendError> {
        Workspace::active(context.as_bytes_mut())?.wipe();
        Ok(())
    }

    fn abort(&self, context: &mut BackendDerivationContext) -> Result<(), BackendError> {
        Workspace::new(context.as_bytes_mut())?.wipe();
        Ok(())
    }
}
