//! # Adapters Layer (Hexagonal Architecture)
//!
//! Reference implementations of the outbound ports, built on RustCrypto.
//! Enabled by the `software-backend` feature.

mod device_secret;
mod software;

pub use device_secret::StaticDeviceSecret;
pub use software::SoftwareBackend;
