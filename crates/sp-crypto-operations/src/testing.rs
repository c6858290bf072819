//! Centralized Testing Utilities
//!
//! Scripted collaborators for exercising the pool and protocols without real
//! cryptography. Available with the `test-utils` feature flag.

use parking_lot::Mutex;
use shared_types::PartitionId;
use std::collections::HashMap;

use crate::domain::{BackendError, OperationFamily, OperationKind};
use crate::ports::{CryptoBackend, DeviceSecretProvider};

pub use shared_types::FixedCaller;

/// Byte written over the start of every workspace the scripted backend sets up.
pub const SCRIPTED_MARKER: u8 = 0xA5;

const MARKER_LEN: usize = 16;

/// Backend call phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// `setup`
    Setup,
    /// `update`
    Update,
    /// `finish`
    Finish,
    /// `abort`
    Abort,
}

/// Backend that records every call and fails on demand.
///
/// Setup stamps [`SCRIPTED_MARKER`] into the workspace before consulting the
/// failure script, so a failing setup leaves a partially written context
/// behind, exactly like a real backend that fails midway.
///
/// # Example
///
/// ```ignore
/// use sp_crypto_operations::testing::{Phase, ScriptedBackend};
/// use sp_crypto_operations::{BackendError, OperationKind};
///
/// let backend = ScriptedBackend::new();
/// backend.fail(OperationKind::Mac, Phase::Finish, BackendError::InvalidSignature);
/// assert!(backend.calls().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    calls: Mutex<Vec<(OperationKind, Phase)>>,
    failures: Mutex<HashMap<(OperationKind, Phase), BackendError>>,
}

impl ScriptedBackend {
    /// Backend that succeeds at everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `phase` call for `kind` fail with `error`.
    pub fn fail(&self, kind: OperationKind, phase: Phase, error: BackendError) {
        self.failures.lock().insert((kind, phase), error);
    }

    /// Removes every scripted failure.
    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Every call received, in order.
    pub fn calls(&self) -> Vec<(OperationKind, Phase)> {
        self.calls.lock().clone()
    }

    /// Phases received for `kind`, in order.
    pub fn phases(&self, kind: OperationKind) -> Vec<Phase> {
        self.calls
            .lock()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, phase)| *phase)
            .collect()
    }

    fn record(&self, kind: OperationKind, phase: Phase) -> Result<(), BackendError> {
        self.calls.lock().push((kind, phase));
        match self.failures.lock().get(&(kind, phase)) {
            Some(error) => Err(*error),
            None => Ok(()),
        }
    }
}

impl<F> CryptoBackend<F> for ScriptedBackend
where
    F: OperationFamily,
    F::Context: AsMut<[u8]>,
    F::StepOutput: Default,
    F::FinishOutput: Default,
{
    fn setup(
        &self,
        context: &mut F::Context,
        _owner: PartitionId,
        _request: F::SetupRequest,
    ) -> Result<(), BackendError> {
        let bytes: &mut [u8] = context.as_mut();
        let len = bytes.len().min(MARKER_LEN);
        bytes[..len].fill(SCRIPTED_MARKER);
        self.record(F::KIND, Phase::Setup)
    }

    fn update(
        &self,
        _context: &mut F::Context,
        _step: F::Step<'_>,
    ) -> Result<F::StepOutput, BackendError> {
        self.record(F::KIND, Phase::Update)?;
        Ok(Default::default())
    }

    fn finish(
        &self,
        _context: &mut F::Context,
        _request: F::FinishRequest<'_>,
    ) -> Result<F::FinishOutput, BackendError> {
        self.record(F::KIND, Phase::Finish)?;
        Ok(Default::default())
    }

    fn abort(&self, _context: &mut F::Context) -> Result<(), BackendError> {
        self.record(F::KIND, Phase::Abort)
    }
}

/// Device secret that remembers every label it was asked about.
///
/// Derives `label[i % len] ^ i` for output byte `i`, which keeps outputs for
/// different labels distinct and longer outputs extensions of shorter ones.
#[derive(Debug, Default)]
pub struct RecordingDeviceSecret {
    labels: Mutex<Vec<Vec<u8>>>,
}

impl RecordingDeviceSecret {
    /// Provider with an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct labels seen, in first-use order.
    pub fn labels(&self) -> Vec<Vec<u8>> {
        self.labels.lock().clone()
    }
}

impl DeviceSecretProvider for RecordingDeviceSecret {
    fn derive(&self, label: &[u8], output: &mut [u8]) -> Result<(), BackendError> {
        if label.is_empty() {
            return Err(BackendError::InvalidArgument);
        }
        {
            let mut labels = self.labels.lock();
            if !labels.iter().any(|seen| seen == label) {
                labels.push(label.to_vec());
            }
        }
        for (i, byte) in output.iter_mut().enumerate() {
            *byte = label[i % label.len()] ^ (i as u8);
        }
        Ok(())
    }
}

/// Partitions used across test suites.
pub mod partitions {
    use shared_types::PartitionId;

    /// A non-secure client.
    pub const NS_CLIENT_A: PartitionId = PartitionId(-1);
    /// Another non-secure client.
    pub const NS_CLIENT_B: PartitionId = PartitionId(-2);
    /// A secure partition.
    pub const SECURE_PARTITION: PartitionId = PartitionId(0x1001);
}
