//! Bootstrap orchestration: platform identification, scanning, registration
//! and activation of components, ending in a ready [`ComponentContainer`].
//!
//! [`ComponentContainer`]: crate::components::ComponentContainer

pub mod activation;
pub mod hooks;
pub mod orchestrator;
pub mod planner;
pub mod stats;

pub use activation::*;
pub use hooks::*;
pub use orchestrator::*;
pub use planner::*;
pub use stats::*;
