//! # Domain Layer
//!
//! Operation pool, backend contexts, protocol families and their rules.

pub mod context;
pub mod entities;
pub mod errors;
pub mod families;
pub mod invariants;
pub mod pool;
pub mod value_objects;

pub use context::*;
pub use entities::*;
pub use errors::*;
pub use families::*;
pub use invariants::*;
pub use pool::*;
pub use value_objects::*;
