//! AES-256-GCM and ChaCha20-Poly1305.
//!
//! Both algorithms are one-shot in the underlying crates, so additional data
//! and payload are buffered in the workspace and sealed or opened on finish.
//! The nonce is supplied as an update step, generated or set once.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::Aes256Gcm;
use chacha20poly1305::ChaCha20Poly1305;
use rand::rngs::OsRng;
use rand::RngCore;
use shared_types::PartitionId;

use super::layout::{self, Workspace};
use super::SoftwareBackend;
use crate::domain::{
    AeadAlgorithm, AeadContext, AeadFamily, AeadFinish, AeadSetup, AeadStep, BackendError,
    CipherDirection,
};
use crate::ports::CryptoBackend;

const AEAD_KEY_LEN: usize = 32;
const NONCE_SET: u8 = 0b01;

fn seal<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    msg: &[u8],
) -> Result<Vec<u8>, BackendError> {
    let cipher = C::new_from_slice(key).map_err(|_| BackendError::BadState)?;
    cipher
        .encrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| BackendError::InsufficientData)
}

fn open<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    aad: &[u8],
    msg: &[u8],
) -> Result<Vec<u8>, BackendError> {
    let cipher = C::new_from_slice(key).map_err(|_| BackendError::BadState)?;
    cipher
        .decrypt(GenericArray::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| BackendError::InvalidSignature)
}

fn step(workspace: &mut Workspace<'_>, step: AeadStep<'_>) -> Result<Vec<u8>, BackendError> {
    let algorithm = AeadAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;

    match step {
        AeadStep::GenerateNonce => {
            if workspace.has_flag(NONCE_SET)
                || workspace.direction() != CipherDirection::Encrypt.tag()
            {
                return Err(BackendError::BadState);
            }
            let mut nonce = vec![0u8; algorithm.nonce_len()];
            OsRng.fill_bytes(&mut nonce);
            workspace.set_nonce(&nonce)?;
            workspace.set_flag(NONCE_SET);
            Ok(nonce)
        }
        AeadStep::SetNonce(nonce) => {
            if workspace.has_flag(NONCE_SET) {
                return Err(BackendError::BadState);
            }
            if nonce.len() != algorithm.nonce_len() {
                return Err(BackendError::InvalidArgument);
            }
            workspace.set_nonce(nonce)?;
            workspace.set_flag(NONCE_SET);
            Ok(Vec::new())
        }
        AeadStep::UpdateAd(ad) => {
            if !workspace.has_flag(NONCE_SET) {
                return Err(BackendError::BadState);
            }
            workspace.append_prefix(ad)?;
            Ok(Vec::new())
        }
        AeadStep::Update(data) => {
            if !workspace.has_flag(NONCE_SET) {
                return Err(BackendError::BadState);
            }
            workspace.append_data(data)?;
            Ok(Vec::new())
        }
    }
}

fn complete(workspace: &Workspace<'_>, request: AeadFinish<'_>) -> Result<Vec<u8>, BackendError> {
    if !workspace.has_flag(NONCE_SET) {
        return Err(BackendError::BadState);
    }
    let algorithm = AeadAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;
    let direction =
        CipherDirection::from_tag(workspace.direction()).ok_or(BackendError::BadState)?;
    let (key, nonce, aad) = (workspace.key(), workspace.nonce(), workspace.prefix());

    match (direction, request) {
        (CipherDirection::Encrypt, AeadFinish::Finish) => match algorithm {
            AeadAlgorithm::Aes256Gcm => seal::<Aes256Gcm>(key, nonce, aad, workspace.data()),
            AeadAlgorithm::ChaCha20Poly1305 => {
                seal::<ChaCha20Poly1305>(key, nonce, aad, workspace.data())
            }
        },
        (CipherDirection::Decrypt, AeadFinish::Verify(tag)) => {
            if tag.len() != algorithm.tag_len() {
                return Err(BackendError::InvalidSignature);
            }
            let mut sealed = Vec::with_capacity(workspace.data().len() + tag.len());
            sealed.extend_from_slice(workspace.data());
            sealed.extend_from_slice(tag);
            match algorithm {
                AeadAlgorithm::Aes256Gcm => open::<Aes256Gcm>(key, nonce, aad, &sealed),
                AeadAlgorithm::ChaCha20Poly1305 => {
                    open::<ChaCha20Poly1305>(key, nonce, aad, &sealed)
                }
            }
        }
        _ => Err(BackendError::BadState),
    }
}

impl CryptoBackend<AeadFamily> for SoftwareBackend {
    fn setup(
        &self,
        context: &mut AeadContext,
        _owner: PartitionId,
        request: AeadSetup,
    ) -> Result<(), BackendError> {
        if request.key.len() != AEAD_KEY_LEN {
            return Err(BackendError::InvalidArgument);
        }
        let mut workspace = Workspace::new(context.as_bytes_mut())?;
        workspace.set_key(request.key.as_bytes())?;
        workspace.activate(request.algorithm.tag(), request.direction.tag());
        Ok(())
    }

    fn update(
        &self,
        context: &mut AeadContext,
        request: AeadStep<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        layout::update_step(context.as_bytes_mut(), |workspace| step(workspace, request))
    }

    fn finish(
        &self,
        context: &mut AeadContext,
        request: AeadFinish<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        let mut workspace = Workspace::active(context.as_bytes_mut())?;
        let output = complete(&workspace, request);
        workspace.wipe();
        output
    }

    fn abort(&self, context: &mut AeadContext) -> Result<(), BackendError> {
        Workspace::new(context.as_bytes_mut())?.wipe();
        Ok(())
    }
}
