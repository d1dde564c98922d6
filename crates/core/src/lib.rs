//! Core types, period arithmetic, and gap location for the rollup engine.
//!
//! Everything here is pure: no I/O, no async. The worker crate drives these
//! pieces against the store, cipher and generation collaborators.

pub mod clock;
pub mod error;
pub mod gap;
pub mod grouper;
pub mod layer;
pub mod maturation;
pub mod owner;
pub mod period;
pub mod summary;

pub use clock::*;
pub use error::{Error, ErrorCode, Result};
pub use gap::*;
pub use grouper::*;
pub use layer::*;
pub use maturation::*;
pub use owner::*;
pub use period::*;
pub use summary::*;
