//! Scene interpretation
//!
//! - `description`: the scene data model decoded from compiler JSON
//! - `registry`: shape name → factory resolution with per-scene overrides
//! - `loader`: builds, binds and commits a scene's bodies

pub mod description;
pub mod loader;
pub mod registry;

pub use description::{BodyEntry, BodySpec, ErrorRecord, Position, SceneDescription, ShapeOptions, WorldSize};
pub use loader::{LoadReport, SceneLoader, VariableTable};
pub use registry::{
    BuiltinShape, FnFactory, Placement, ShapeFactory, ShapeOverrides, ShapeRegistry, TemplateFactory,
    circle_radius, rectangle_size,
};
