//! Service fixtures backed by the software backend.

use std::sync::Arc;

use shared_types::{DispatchedCaller, FixedCaller, PartitionId};
use sp_crypto_operations::{
    CryptoService, ServiceConfig, SoftwareBackend, StaticDeviceSecret, WipePolicy,
};
use sp_telemetry::TelemetryConfig;

/// Service answering a single fixed caller.
pub type SingleCallerService = CryptoService<SoftwareBackend, StaticDeviceSecret, FixedCaller>;

/// Service shared by callers bound through a dispatcher.
pub type DispatchedService =
    CryptoService<SoftwareBackend, StaticDeviceSecret, Arc<DispatchedCaller>>;

/// Device secret used wherever a test needs reproducible derivations.
pub const DEVICE_SECRET: [u8; 32] = [0x42; 32];

/// Installs a quiet subscriber once per test binary; later calls are no-ops.
pub fn init_logging() {
    let _ = sp_telemetry::init_telemetry(TelemetryConfig::for_tests()).map(std::mem::forget);
}

/// Config with the given capacity and the hardening wipe policy.
pub fn hardened_config(capacity: usize) -> ServiceConfig {
    ServiceConfig {
        pool_capacity: capacity,
        wipe_policy: WipePolicy::Always,
    }
}

/// Service for one partition.
pub fn single_caller(owner: PartitionId, capacity: usize) -> SingleCallerService {
    init_logging();
    CryptoService::new(
        hardened_config(capacity),
        Arc::new(SoftwareBackend::new()),
        Arc::new(StaticDeviceSecret::new(DEVICE_SECRET)),
        FixedCaller::new(owner),
    )
    .expect("valid config")
}

/// Service for many partitions, plus the dispatcher binding callers to threads.
pub fn dispatched(capacity: usize) -> (Arc<DispatchedService>, Arc<DispatchedCaller>) {
    init_logging();
    let identity = Arc::new(DispatchedCaller::new());
    let service = CryptoService::new(
        hardened_config(capacity),
        Arc::new(SoftwareBackend::new()),
        Arc::new(StaticDeviceSecret::new(DEVICE_SECRET)),
        identity.clone(),
    )
    .expect("valid config");
    (Arc::new(service), identity)
}
