//! # Crypto Operation Service
//!
//! Application service implementing the five inbound ports.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Resolves the caller through the injected [`CallerIdentity`]
//! - Drives one [`OperationProtocol`] per family over a single shared pool
//! - Routes key derivation through [`KeyDerivationDelegates`]
//! - Logs outcomes and maintains [`ServiceMetrics`]
//!
//! The pool and protocols never log; everything observable happens here.

use parking_lot::Mutex;
use shared_types::{CallerIdentity, OperationHandle, PartitionId};
use sp_telemetry::log_operation_event;
use std::sync::Arc;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::config::{ConfigError, ServiceConfig};
use crate::domain::{
    AeadAlgorithm, AeadFamily, AeadFinish, AeadSetup, AeadStep, CipherAlgorithm,
    CipherDirection, CipherFamily, CipherSetup, CipherStep, CryptoServiceError, DerivationInput,
    DerivationOutput, DerivationStep, HashAlgorithm, HashFamily, HashFinish, HashSetup,
    KeyDerivationAlgorithm, KeyDerivationFamily, KeyDerivationSetup, KeyMaterial, MacAlgorithm,
    MacDirection, MacFamily, MacFinish, MacSetup, OperationKind, OperationPool, PoolStatus,
};
use crate::metrics::{MetricsSnapshot, ServiceMetrics};
use crate::ports::{
    AeadApi, CipherApi, CryptoBackendSuite, DeviceSecretProvider, HashApi, KeyDerivationApi,
    MacApi,
};
use crate::protocol::{KeyDerivationDelegates, OperationProtocol, SharedPool};

const SUBSYSTEM: &str = "sp-crypto";

/// Protocol phase of a service call, for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Setup,
    Update,
    Finish,
    Abort,
}

impl Stage {
    fn as_str(self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Update => "update",
            Stage::Finish => "finish",
            Stage::Abort => "abort",
        }
    }
}

/// Crypto operation service.
///
/// One instance owns one pool. Every call resolves its caller first; a call
/// without an identifiable caller fails with `ProgrammerError` before
/// touching the pool.
pub struct CryptoService<B, S, I> {
    pool: SharedPool,
    cipher: OperationProtocol<CipherFamily, B>,
    hash: OperationProtocol<HashFamily, B>,
    mac: OperationProtocol<MacFamily, B>,
    aead: OperationProtocol<AeadFamily, B>,
    key_derivation: OperationProtocol<KeyDerivationFamily, KeyDerivationDelegates<B, S>>,
    identity: I,
    metrics: ServiceMetrics,
    config: ServiceConfig,
}

impl<B, S, I> CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    /// Create a new service.
    ///
    /// # Arguments
    /// * `config` - Pool capacity and wipe policy
    /// * `backend` - Crypto backend serving every family
    /// * `device_secret` - Provider for device-bound derivations
    /// * `identity` - Source of the caller's partition id
    pub fn new(
        config: ServiceConfig,
        backend: Arc<B>,
        device_secret: Arc<S>,
        identity: I,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let pool = OperationPool::new(config.pool_capacity).map_err(|_| {
            ConfigError::CapacityOutOfRange {
                capacity: config.pool_capacity,
                max: crate::domain::MAX_POOL_CAPACITY,
            }
        })?;
        let pool: SharedPool = Arc::new(Mutex::new(pool));
        let wipe = config.wipe_policy.terminal_wipe();

        let delegates = Arc::new(KeyDerivationDelegates::new(backend.clone(), device_secret));

        info!(
            capacity = config.pool_capacity,
            wipe_policy = ?config.wipe_policy,
            "[sp-crypto] Operation pool ready"
        );

        Ok(Self {
            cipher: OperationProtocol::new(pool.clone(), backend.clone()).with_terminal_wipe(wipe),
            hash: OperationProtocol::new(pool.clone(), backend.clone()).with_terminal_wipe(wipe),
            mac: OperationProtocol::new(pool.clone(), backend.clone()).with_terminal_wipe(wipe),
            aead: OperationProtocol::new(pool.clone(), backend).with_terminal_wipe(wipe),
            key_derivation: OperationProtocol::new(pool.clone(), delegates)
                .with_terminal_wipe(wipe),
            pool,
            identity,
            metrics: ServiceMetrics::new(),
            config,
        })
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Snapshot of pool occupancy.
    pub fn status(&self) -> PoolStatus {
        self.pool.lock().status()
    }

    /// Snapshot of the service counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Handles the current caller holds.
    pub fn caller_handles(&self) -> Result<Vec<OperationHandle>, CryptoServiceError> {
        let owner = self.caller()?;
        Ok(self.pool.lock().live_handles(owner))
    }

    /// Releases and zeroizes every operation owned by `owner`.
    ///
    /// For use by the dispatcher when a partition goes away. Returns the
    /// number of operations released.
    pub fn reset_partition(&self, owner: PartitionId) -> usize {
        let released = self.pool.lock().release_all_owned_by(owner);
        self.metrics.record_partition_reset(released);
        info!(
            owner = %owner,
            released,
            "[sp-crypto] Released operations of partition"
        );
        released
    }

    fn caller(&self) -> Result<PartitionId, CryptoServiceError> {
        self.identity.caller().map_err(|err| {
            warn!(error = %err, "[sp-crypto] Request without a resolvable caller");
            CryptoServiceError::from(err)
        })
    }

    /// Resolves the caller, runs `call` and records the outcome.
    fn run<T>(
        &self,
        kind: OperationKind,
        stage: Stage,
        handle: &mut OperationHandle,
        call: impl FnOnce(PartitionId, &mut OperationHandle) -> Result<T, CryptoServiceError>,
    ) -> Result<T, CryptoServiceError> {
        let owner = self.caller()?;
        let was_live = handle.is_valid();
        let result = call(owner, handle);
        self.observe(kind, stage, owner, was_live, *handle, &result);
        result
    }

    fn observe<T>(
        &self,
        kind: OperationKind,
        stage: Stage,
        owner: PartitionId,
        was_live: bool,
        handle: OperationHandle,
        result: &Result<T, CryptoServiceError>,
    ) {
        match result {
            Ok(_) => {
                match stage {
                    Stage::Setup => self.metrics.record_started(),
                    Stage::Finish => self.metrics.record_completed(),
                    Stage::Abort if was_live && !handle.is_valid() => {
                        self.metrics.record_aborted()
                    }
                    _ => {}
                }
                log_operation_event!(
                    debug,
                    SUBSYSTEM,
                    "[sp-crypto] Operation step completed",
                    owner,
                    kind,
                    stage = stage.as_str(),
                    handle = handle.raw()
                );
            }
            Err(CryptoServiceError::PoolExhausted { capacity }) => {
                self.metrics.record_pool_exhausted();
                log_operation_event!(
                    warn,
                    SUBSYSTEM,
                    "[sp-crypto] Operation pool exhausted",
                    owner,
                    kind,
                    capacity = *capacity
                );
            }
            Err(CryptoServiceError::BadState) => {
                self.metrics.record_rejected_handle();
                log_operation_event!(
                    warn,
                    SUBSYSTEM,
                    "[sp-crypto] Handle rejected",
                    owner,
                    kind,
                    stage = stage.as_str()
                );
            }
            Err(CryptoServiceError::Backend(err)) => {
                self.metrics.record_backend_failure();
                log_operation_event!(
                    debug,
                    SUBSYSTEM,
                    "[sp-crypto] Backend reported failure",
                    owner,
                    kind,
                    stage = stage.as_str(),
                    error = %err,
                    released = !handle.is_valid()
                );
            }
            Err(err) => {
                log_operation_event!(
                    debug,
                    SUBSYSTEM,
                    "[sp-crypto] Request rejected",
                    owner,
                    kind,
                    stage = stage.as_str(),
                    error = %err
                );
            }
        }
    }

    fn cipher_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: CipherAlgorithm,
        direction: CipherDirection,
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Setup, handle, |owner, handle| {
            self.cipher.setup(
                owner,
                handle,
                CipherSetup {
                    key,
                    algorithm,
                    direction,
                },
            )
        })
    }

    fn mac_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: MacAlgorithm,
        direction: MacDirection,
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Mac, Stage::Setup, handle, |owner, handle| {
            self.mac.setup(
                owner,
                handle,
                MacSetup {
                    key,
                    algorithm,
                    direction,
                },
            )
        })
    }

    fn aead_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: AeadAlgorithm,
        direction: CipherDirection,
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Setup, handle, |owner, handle| {
            self.aead.setup(
                owner,
                handle,
                AeadSetup {
                    key,
                    algorithm,
                    direction,
                },
            )
        })
    }

    fn derivation_step(
        &self,
        handle: &mut OperationHandle,
        step: DerivationStep<'_>,
    ) -> Result<DerivationOutput, CryptoServiceError> {
        self.run(
            OperationKind::KeyDerivation,
            Stage::Update,
            handle,
            |owner, handle| self.key_derivation.update(handle, owner, step),
        )
    }
}

fn unexpected_output(output: DerivationOutput) -> CryptoServiceError {
    let variant = match output {
        DerivationOutput::Accepted => "Accepted",
        DerivationOutput::Capacity(_) => "Capacity",
        DerivationOutput::Bytes(_) => "Bytes",
    };
    CryptoServiceError::ProgrammerError(format!("unexpected derivation output: {}", variant))
}

// =============================================================================
// CIPHER
// =============================================================================

impl<B, S, I> CipherApi for CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    fn cipher_encrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: CipherAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.cipher_setup(handle, key, algorithm, CipherDirection::Encrypt)
    }

    fn cipher_decrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: CipherAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.cipher_setup(handle, key, algorithm, CipherDirection::Decrypt)
    }

    fn cipher_generate_iv(
        &self,
        handle: &mut OperationHandle,
    ) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Update, handle, |owner, handle| {
            self.cipher.update(handle, owner, CipherStep::GenerateIv)
        })
    }

    fn cipher_set_iv(
        &self,
        handle: &mut OperationHandle,
        iv: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Update, handle, |owner, handle| {
            self.cipher
                .update(handle, owner, CipherStep::SetIv(iv))
                .map(drop)
        })
    }

    fn cipher_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Update, handle, |owner, handle| {
            self.cipher.update(handle, owner, CipherStep::Update(input))
        })
    }

    fn cipher_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Finish, handle, |owner, handle| {
            self.cipher.finish(handle, owner, ())
        })
    }

    fn cipher_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Cipher, Stage::Abort, handle, |owner, handle| {
            self.cipher.abort(handle, owner)
        })
    }
}

// =============================================================================
// HASH
// =============================================================================

impl<B, S, I> HashApi for CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    fn hash_setup(
        &self,
        handle: &mut OperationHandle,
        algorithm: HashAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Setup, handle, |owner, handle| {
            self.hash.setup(owner, handle, HashSetup { algorithm })
        })
    }

    fn hash_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Update, handle, |owner, handle| {
            self.hash.update(handle, owner, input)
        })
    }

    fn hash_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Finish, handle, |owner, handle| {
            self.hash.finish(handle, owner, HashFinish::Digest)
        })
    }

    fn hash_verify(
        &self,
        handle: &mut OperationHandle,
        expected: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Finish, handle, |owner, handle| {
            self.hash
                .finish(handle, owner, HashFinish::Verify(expected))
                .map(drop)
        })
    }

    fn hash_clone(
        &self,
        source: OperationHandle,
        target: &mut OperationHandle,
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Setup, target, |owner, target| {
            self.hash.clone_operation(source, owner, target)
        })
    }

    fn hash_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Hash, Stage::Abort, handle, |owner, handle| {
            self.hash.abort(handle, owner)
        })
    }
}

// =============================================================================
// MAC
// =============================================================================

impl<B, S, I> MacApi for CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    fn mac_sign_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: MacAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.mac_setup(handle, key, algorithm, MacDirection::Sign)
    }

    fn mac_verify_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: MacAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.mac_setup(handle, key, algorithm, MacDirection::Verify)
    }

    fn mac_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Mac, Stage::Update, handle, |owner, handle| {
            self.mac.update(handle, owner, input)
        })
    }

    fn mac_sign_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Mac, Stage::Finish, handle, |owner, handle| {
            self.mac.finish(handle, owner, MacFinish::Sign)
        })
    }

    fn mac_verify_finish(
        &self,
        handle: &mut OperationHandle,
        expected: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Mac, Stage::Finish, handle, |owner, handle| {
            self.mac
                .finish(handle, owner, MacFinish::Verify(expected))
                .map(drop)
        })
    }

    fn mac_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Mac, Stage::Abort, handle, |owner, handle| {
            self.mac.abort(handle, owner)
        })
    }
}

// =============================================================================
// AEAD
// =============================================================================

impl<B, S, I> AeadApi for CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    fn aead_encrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: AeadAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.aead_setup(handle, key, algorithm, CipherDirection::Encrypt)
    }

    fn aead_decrypt_setup(
        &self,
        handle: &mut OperationHandle,
        key: KeyMaterial,
        algorithm: AeadAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.aead_setup(handle, key, algorithm, CipherDirection::Decrypt)
    }

    fn aead_generate_nonce(
        &self,
        handle: &mut OperationHandle,
    ) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Update, handle, |owner, handle| {
            self.aead.update(handle, owner, AeadStep::GenerateNonce)
        })
    }

    fn aead_set_nonce(
        &self,
        handle: &mut OperationHandle,
        nonce: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Update, handle, |owner, handle| {
            self.aead
                .update(handle, owner, AeadStep::SetNonce(nonce))
                .map(drop)
        })
    }

    fn aead_update_ad(
        &self,
        handle: &mut OperationHandle,
        data: &[u8],
    ) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Update, handle, |owner, handle| {
            self.aead
                .update(handle, owner, AeadStep::UpdateAd(data))
                .map(drop)
        })
    }

    fn aead_update(
        &self,
        handle: &mut OperationHandle,
        input: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Update, handle, |owner, handle| {
            self.aead.update(handle, owner, AeadStep::Update(input))
        })
    }

    fn aead_finish(&self, handle: &mut OperationHandle) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Finish, handle, |owner, handle| {
            self.aead.finish(handle, owner, AeadFinish::Finish)
        })
    }

    fn aead_verify(
        &self,
        handle: &mut OperationHandle,
        tag: &[u8],
    ) -> Result<Vec<u8>, CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Finish, handle, |owner, handle| {
            self.aead.finish(handle, owner, AeadFinish::Verify(tag))
        })
    }

    fn aead_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError> {
        self.run(OperationKind::Aead, Stage::Abort, handle, |owner, handle| {
            self.aead.abort(handle, owner)
        })
    }
}

// =============================================================================
// KEY DERIVATION
// =============================================================================

impl<B, S, I> KeyDerivationApi for CryptoService<B, S, I>
where
    B: CryptoBackendSuite,
    S: DeviceSecretProvider + 'static,
    I: CallerIdentity,
{
    fn key_derivation_setup(
        &self,
        handle: &mut OperationHandle,
        algorithm: KeyDerivationAlgorithm,
    ) -> Result<(), CryptoServiceError> {
        self.run(
            OperationKind::KeyDerivation,
            Stage::Setup,
            handle,
            |owner, handle| {
                self.key_derivation
                    .setup(owner, handle, KeyDerivationSetup { algorithm })
            },
        )
    }

    fn key_derivation_input_bytes(
        &self,
        handle: &mut OperationHandle,
        step: DerivationInput,
        data: &[u8],
    ) -> Result<(), CryptoServiceError> {
        match self.derivation_step(handle, DerivationStep::Input { step, data })? {
            DerivationOutput::Accepted => Ok(()),
            other => Err(unexpected_output(other)),
        }
    }

    fn key_derivation_set_capacity(
        &self,
        handle: &mut OperationHandle,
        capacity: usize,
    ) -> Result<(), CryptoServiceError> {
        match self.derivation_step(handle, DerivationStep::SetCapacity(capacity))? {
            DerivationOutput::Accepted => Ok(()),
            other => Err(unexpected_output(other)),
        }
    }

    fn key_derivation_get_capacity(
        &self,
        handle: &mut OperationHandle,
    ) -> Result<usize, CryptoServiceError> {
        match self.derivation_step(handle, DerivationStep::GetCapacity)? {
            DerivationOutput::Capacity(remaining) => Ok(remaining),
            other => Err(unexpected_output(other)),
        }
    }

    fn key_derivation_output_bytes(
        &self,
        handle: &mut OperationHandle,
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoServiceError> {
        match self.derivation_step(handle, DerivationStep::Output(len))? {
            DerivationOutput::Bytes(bytes) => Ok(bytes),
            other => Err(unexpected_output(other)),
        }
    }

    fn key_derivation_finish(
        &self,
        handle: &mut OperationHandle,
    ) -> Result<(), CryptoServiceError> {
        self.run(
            OperationKind::KeyDerivation,
            Stage::Finish,
            handle,
            |owner, handle| self.key_derivation.finish(handle, owner, ()),
        )
    }

    fn key_derivation_abort(&self, handle: &mut OperationHandle) -> Result<(), CryptoServiceError> {
        self.run(
            OperationKind::KeyDerivation,
            Stage::Abort,
            handle,
            |owner, handle| self.key_derivation.abort(handle, owner),
        )
    }
}
