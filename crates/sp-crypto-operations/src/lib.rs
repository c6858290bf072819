//! # Secure Partition Crypto Operations
//!
//! Operation-context pool and multipart crypto protocols served to mutually
//! untrusted caller partitions.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Every multipart operation (cipher, hash, MAC, AEAD, key derivation) lives
//! in one slot of a fixed-capacity pool between `setup` and `finish`/`abort`.
//! Callers only ever hold an opaque [`OperationHandle`]; a handle resolves
//! solely for the partition and the kind it was issued to.
//!
//! ## Security Properties
//!
//! | Property | Enforcement |
//! |----------|-------------|
//! | Partition isolation | Lookup requires matching owner and kind |
//! | Uniform rejection | Every unresolvable handle yields the same `BadState` |
//! | Bounded resources | At most `pool_capacity` live operations |
//! | No residue | Failed setups wipe their slot; backends wipe on finish and abort |
//! | Caller-bound derivation | Device-secret labels are prefixed with the owner id |
//!
//! ## Module Structure
//!
//! ```text
//! sp-crypto-operations/
//! ├── domain/          # Pool, contexts, families, errors, invariants
//! ├── ports/           # Inbound APIs + CryptoBackend / DeviceSecretProvider
//! ├── protocol/        # setup → update* → finish | abort, key-derivation delegates
//! ├── adapters/        # RustCrypto software backend, static device secret
//! ├── service.rs       # CryptoService wiring identity, protocols, metrics
//! ├── config.rs        # ServiceConfig
//! └── metrics.rs       # ServiceMetrics
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "software-backend")]
pub mod adapters;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod protocol;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
#[cfg(feature = "software-backend")]
pub use adapters::{SoftwareBackend, StaticDeviceSecret};
pub use config::{ConfigError, ServiceConfig, WipePolicy};
pub use domain::{
    AeadAlgorithm, BackendContext, BackendError, CipherAlgorithm, CipherDirection,
    CryptoServiceError, DerivationInput, HashAlgorithm, KeyDerivationAlgorithm, KeyMaterial,
    MacAlgorithm, MacDirection, OperationKind, OperationPool, PoolStatus, Wipe,
    DEFAULT_POOL_CAPACITY, MAX_DERIVATION_LABEL, MAX_POOL_CAPACITY,
};
pub use metrics::{MetricsSnapshot, ServiceMetrics};
pub use ports::{
    AeadApi, CipherApi, CryptoBackend, CryptoBackendSuite, DeviceSecretProvider, HashApi,
    KeyDerivationApi, MacApi,
};
pub use protocol::{KeyDerivationDelegates, OperationProtocol, SharedPool};
pub use service::CryptoService;
pub use shared_types::{CallerIdentity, OperationHandle, PartitionId, StatusCode};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
