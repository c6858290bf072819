//! SHA-2 digests, streamed through a [`sha2_state`] area.

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use shared_types::PartitionId;
use subtle::ConstantTimeEq;

use super::layout::{self, Workspace};
use super::sha2_state;
use super::SoftwareBackend;
use crate::domain::{BackendError, HashAlgorithm, HashContext, HashFamily, HashFinish, HashSetup};
use crate::ports::CryptoBackend;

pub(crate) fn digest(algorithm: HashAlgorithm, data: &[u8]) -> Vec<u8> {
    match algorithm {
        HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
        HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
        HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

impl CryptoBackend<HashFamily> for SoftwareBackend {
    fn setup(
        &self,
        context: &mut HashContext,
        _owner: PartitionId,
        request: HashSetup,
    ) -> Result<(), BackendError> {
        let mut workspace = Workspace::new(context.as_bytes_mut())?;
        sha2_state::init(
            request.algorithm,
            sha2_state::area(workspace.buffer_mut(), 0)?,
        );
        workspace.activate(request.algorithm.tag(), 0);
        Ok(())
    }

    fn update(&self, context: &mut HashContext, input: &[u8]) -> Result<(), BackendError> {
        layout::update_step(context.as_bytes_mut(), |workspace| {
            let algorithm =
                HashAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;
            sha2_state::absorb(algorithm, sha2_state::area(workspace.buffer_mut(), 0)?, input);
            Ok(())
        })
    }

    fn finish(
        &self,
        context: &mut HashContext,
        request: HashFinish<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        let mut workspace = Workspace::active(context.as_bytes_mut())?;
        let algorithm =
            HashAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;
        let computed = sha2_state::area(workspace.buffer_mut(), 0)
            .map(|state| sha2_state::finalize(algorithm, state));
        workspace.wipe();
        let computed = computed?;

        match request {
            HashFinish::Digest => Ok(computed),
            HashFinish::Verify(expected) => {
                if bool::from(computed.as_slice().ct_eq(expected)) {
                    Ok(Vec::new())
                } else {
                    Err(BackendError::InvalidSignature)
                }
            }
        }
    }

    fn abort(&self, context: &mut HashContext) -> Result<(), BackendError> {
        Workspace::new(context.as_bytes_mut())?.wipe();
        Ok(())
    }
}
