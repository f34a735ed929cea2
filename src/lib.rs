//! Scene Stage - declarative scenes for a 2D physics simulation
//!
//! Core modules:
//! - `scene`: Scene description model, shape factory registry, scene loader
//! - `sim`: Simulation lifecycle (ready/running/paused/disposed)
//! - `physics`: Engine interface, body handles, built-in world
//! - `render`: Render surface interface and headless surface
//! - `compile`: Remote scene compilation
//! - `stage`: Host-facing facade tying it together

pub mod compile;
pub mod config;
pub mod error;
pub mod physics;
pub mod render;
pub mod scene;
pub mod sim;
pub mod stage;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use compile::{CompileClient, CompileOutcome, CompileTransport, HttpTransport};
pub use config::StageConfig;
pub use error::{Result, StageError};
pub use scene::{LoadReport, SceneDescription, SceneLoader, ShapeRegistry, VariableTable};
pub use sim::{LifecyclePhase, SimulationLifecycle};
pub use stage::Stage;

/// Stage defaults
pub mod consts {
    /// Circle radius when neither `width` nor `radius` is given
    pub const DEFAULT_CIRCLE_RADIUS: f32 = 25.0;
    /// Rectangle side when `width`/`height` is missing
    pub const DEFAULT_RECTANGLE_SIZE: f32 = 100.0;
    /// Camera extent when the scene's world omits a dimension
    pub const DEFAULT_WORLD_SIZE: f32 = 1000.0;
    /// Placement index for bodies built outside an indexed batch
    pub const UNBATCHED_INDEX: i32 = -1;

    /// Host surface defaults
    pub const DEFAULT_SURFACE_WIDTH: f32 = 800.0;
    pub const DEFAULT_SURFACE_HEIGHT: f32 = 600.0;

    /// Compiler endpoint and request timeout
    pub const DEFAULT_COMPILE_URL: &str = "/compile";
    pub const COMPILE_TIMEOUT_MS: u64 = 5000;

    /// Built-in world: pixels/s² per unit of gravity
    pub const GRAVITY_SCALE: f32 = 1000.0;
    /// Fixed step (60 Hz)
    pub const TIME_STEP: f32 = 1.0 / 60.0;
}
