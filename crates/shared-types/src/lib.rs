//! # Shared Types Crate
//!
//! Identity, handle and status types shared by the crypto service crates.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate types are defined here.
//! - **Dispatcher Authority**: the partition id of a caller comes only from
//!   a [`CallerIdentity`]; request payloads never carry an owner field.
//! - **Closed Status Set**: every failure crossing the service boundary is
//!   one of the [`StatusCode`] values.

pub mod entities;
pub mod errors;
pub mod identity;

pub use entities::*;
pub use errors::*;
pub use identity::*;
