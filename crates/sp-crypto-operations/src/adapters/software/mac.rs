//! HMAC over SHA-2, built on two [`sha2_state`] areas.
//!
//! Area 0 holds the inner hash keyed with `K0 ^ ipad`, area 1 the outer hash
//! keyed with `K0 ^ opad`. Keys longer than one block are hashed down to
//! `K0` first, so key length is not bounded by the workspace.

use shared_types::PartitionId;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::hash::digest;
use super::layout::{self, Workspace};
use super::sha2_state;
use super::SoftwareBackend;
use crate::domain::{
    BackendError, HashAlgorithm, MacAlgorithm, MacContext, MacDirection, MacFamily, MacFinish,
    MacSetup,
};
use crate::ports::CryptoBackend;

const INNER: usize = 0;
const OUTER: usize = 1;
const IPAD: u8 = 0x36;
const OPAD: u8 = 0x5c;

fn hash_of(algorithm: MacAlgorithm) -> HashAlgorithm {
    match algorithm {
        MacAlgorithm::HmacSha256 => HashAlgorithm::Sha256,
        MacAlgorithm::HmacSha512 => HashAlgorithm::Sha512,
    }
}

/// Key padded or reduced to one block.
fn block_key(hash: HashAlgorithm, key: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut k0 = Zeroizing::new(vec![0u8; sha2_state::block_len(hash)]);
    if key.len() > k0.len() {
        let reduced = Zeroizing::new(digest(hash, key));
        k0[..reduced.len()].copy_from_slice(&reduced);
    } else {
        k0[..key.len()].copy_from_slice(key);
    }
    k0
}

fn finish_tag(workspace: &mut Workspace<'_>) -> Result<(MacDirection, Vec<u8>), BackendError> {
    let algorithm = MacAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;
    let direction = MacDirection::from_tag(workspace.direction()).ok_or(BackendError::BadState)?;
    let hash = hash_of(algorithm);

    let inner = Zeroizing::new(sha2_state::finalize(
        hash,
        sha2_state::area(workspace.buffer_mut(), INNER)?,
    ));
    let outer = sha2_state::area(workspace.buffer_mut(), OUTER)?;
    sha2_state::absorb(hash, outer, &inner);
    Ok((direction, sha2_state::finalize(hash, outer)))
}

impl CryptoBackend<MacFamily> for SoftwareBackend {
    fn setup(
        &self,
        context: &mut MacContext,
        _owner: PartitionId,
        request: MacSetup,
    ) -> Result<(), BackendError> {
        let key = request.key.as_bytes();
        if key.is_empty() {
            return Err(BackendError::InvalidArgument);
        }
        let hash = hash_of(request.algorithm);
        let k0 = block_key(hash, key);

        let mut workspace = Workspace::new(context.as_bytes_mut())?;
        for (index, pad) in [(INNER, IPAD), (OUTER, OPAD)] {
            let padded: Zeroizing<Vec<u8>> = Zeroizing::new(k0.iter().map(|b| b ^ pad).collect());
            let state = sha2_state::area(workspace.buffer_mut(), index)?;
            sha2_state::init(hash, state);
            sha2_state::absorb(hash, state, &padded);
        }
        workspace.activate(request.algorithm.tag(), request.direction.tag());
        Ok(())
    }

    fn update(&self, context: &mut MacContext, input: &[u8]) -> Result<(), BackendError> {
        layout::update_step(context.as_bytes_mut(), |workspace| {
            let algorithm =
                MacAlgorithm::from_tag(workspace.algorithm()).ok_or(BackendError::BadState)?;
            let state = sha2_state::area(workspace.buffer_mut(), INNER)?;
            sha2_state::absorb(hash_of(algorithm), state, input);
            Ok(())
        })
    }

    fn finish(
        &self,
        context: &mut MacContext,
        request: MacFinish<'_>,
    ) -> Result<Vec<u8>, BackendError> {
        let mut workspace = Workspace::active(context.as_bytes_mut())?;
        let computed = finish_tag(&mut workspace);
        workspace.wipe();
        let (direction, tag) = computed?;

        match (direction, request) {
            (MacDirection::Sign, MacFinish::Sign) => Ok(tag),
            (MacDirection::Verify, MacFinish::Verify(expected)) => {
                if bool::from(tag.as_slice().ct_eq(expected)) {
                    Ok(Vec::new())
                } else {
                    Err(BackendError::InvalidSignature)
                }
            }
            _ => Err(BackendError::BadState),
        }
    }

    fn abort(&self, context: &mut MacContext) -> Result<(), BackendError> {
        Workspace::new(context.as_bytes_mut())?.wipe();
        Ok(())
    }
}
