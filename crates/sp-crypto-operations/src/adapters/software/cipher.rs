//! ChaCha20 and AES-256-CTR stream ciphers.
//!
//! The workspace keeps the key, the IV and the keystream position, so each
//! update rebuilds the cipher and seeks to where the previous one stopped.

use aes::Aes256;
use chacha20::cipher::{KeyIvInit, StreamCipher, StreamCipherSeek};
use chacha20::ChaCha20;
use rand::rngs::OsRng;
use rand::RngCore;
use shared_types::PartitionId;

use super::layout::{self, Workspace};
use super::SoftwareBackend;
use crate::domain::{
    BackendError, CipherAlgorithm, CipherContext, CipherDirection, CipherFamily, CipherSetup,
    CipherStep,
};
use crate::ports::CryptoBackend;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

const IV_SET: u8 = 0b01;
const KEY_LEN: usize = 32;

fn apply_keystream<C>(workspace: &mut Workspace<'_>, data: &[u8]) -> Result<Vec<u8>, BackendError>
where
    C: KeyIvInit + StreamCipher + StreamCipherSeek,
{
    let mut cipher =
        C::new_from_slices(workspace.key(), workspace.nonce()).map_err(|_| BackendError::BadState)?;
    let position = workspace.counter();
    cipher
        .try_seek(position)
        .map_err(|_| BackendError::InsufficientData)?;

    let mut output = data.to_vec();
    cipher
        .try_apply_keystream(&mut output)
        .map_err(|_| BackendError::InsufficientData)?;
    workspace.set_counter(position + data.len() as u64);
    Ok(output)
}

fn step(workspace: &mut Workspace<'_>, step: CipherStep<'_>) -> Result<Vec<u8>, BackendError> {
    let algorithm =
        CipherAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;

    match step {
        CipherStep::GenerateIv => {
            if workspace.has_flag(IV_SET) || workspace.direction() != CipherDirection::Encrypt.tag()
            {
                return Err(BackendError::BadState);
            }
            let mut iv = vec![0u8; algorithm.iv_len()];
            OsRng.fill_bytes(&mut iv);
            workspace.set_nonce(&iv)?;
            workspace.set_flag(IV_SET);
            Ok(iv)
        }
        CipherStep::SetIv(iv) => {
            if workspace.has_flag(IV_SET) {
                return Err(BackendError::BadState);
            }
            if iv.len() != algorithm.iv_len() {
                return Err(BackendError::InvalidArgument);
            }
            workspace.set_nonce(iv)?;
            workspace.set_flag(IV_SET);
            Ok(Vec::new())
        }
        CipherStep::Update(data) => {
            if !workspace.has_flag(IV_SET) {
                return Err(BackendError::BadState);
            }
            match algorithm {
                CipherAlgorithm::ChaCha20 => apply_keystream::<ChaCha20>(workspace, data),
                CipherAlgorithm::Aes256Ctr => apply_keystream::<Aes256Ctr>(workspace, data),
            }
        }
    }
}

impl CryptoBackend<CipherFamily> for SoftwareBackend {
    fn setup(
        &self,
        context: &mut CipherContext,
        _owner: PartitionId,
        request: CipherSetup,
    ) -> Result<(), BackendError> {
        if request.key.len() != KEY_LEN {
            return Err(BackendError::InvalidArgument);
        }
        let mut workspace = Workspace::new(context.as_bytes_mut())?;
        workspace.set_key(request.key.as_bytes())?;
        workspace.activate(request.algorithm.tag(), request.direction.tag());
        Ok(())
    }

    fn update(
        &self,
        context: &mut CipherContext,
        request: CipherStep<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        layout::update_step(context.as_bytes_mut(), |workspace| step(workspace, request))
    }

    fn finish(&self, context: &mut CipherContext, _request: ()) -> Result<Vec<u8>, BackendError> {
        let mut workspace = Workspace::active(context.as_bytes_mut())?;
        let iv_set = workspace.has_flag(IV_SET);
        workspace.wipe();
        if !iv_set {
            return Err(BackendError::BadState);
        }
        Ok(Vec::new())
    }

    fn abort(&self, context: &mut CipherContext) -> Result<(), BackendError> {
        Workspace::new(context.as_bytes_mut())?.wipe();
        Ok(())
    }
}
