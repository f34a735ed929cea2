//! Simulation lifecycle
//!
//! Whether physics steps and frames are drawn. The physics and drawing
//! themselves belong to the engine and surface collaborators.

pub mod lifecycle;

pub use lifecycle::{LifecyclePhase, SimulationLifecycle};
