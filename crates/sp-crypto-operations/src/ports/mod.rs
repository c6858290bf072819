//! # Ports Layer
//!
//! Inbound APIs served to caller partitions and outbound dependencies on the
//! crypto backend and device secret.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
