//! Rollup workers for the summary hierarchy.
//!
//! - Orchestrator (one bounded pass: gap -> decrypt -> generate -> encrypt -> persist)
//! - Invocation trigger (per owner/layer throttle for on-access rollups)
//! - Scheduler (optional background sweep)
//! - Cipher and generation collaborators

pub mod cipher;
pub mod config;
pub mod generation;
pub mod rollup;
pub mod scheduler;
pub mod trigger;

pub use cipher::{Cipher, PassthroughCipher};
pub use config::*;
pub use generation::*;
pub use rollup::RollupOrchestrator;
pub use scheduler::*;
pub use trigger::*;
