//! # Secure Partition Crypto Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Service construction shared by every suite
//! │
//! ├── exploits/         # Attack simulations against partition isolation
//! │   ├── partition_isolation.rs
//! │   ├── handle_enumeration.rs
//! │   └── key_derivation_binding.rs
//! │
//! └── integration/      # End-to-end flows through the software backend
//!     ├── operation_flows.rs
//!     ├── pool_scenario.rs
//!     └── concurrency.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p sp-tests
//!
//! # By category
//! cargo test -p sp-tests integration::
//! cargo test -p sp-tests exploits::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod fixtures;
