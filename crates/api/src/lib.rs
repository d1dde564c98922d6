//! HTTP surface for triggering and inspecting rollups.

pub mod extractors;
pub mod response;
pub mod routes;
pub mod state;

pub use routes::router;
pub use state::{AppState, TriggerRegistry};
