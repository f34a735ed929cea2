//! Physics collaborator
//!
//! Body handles, the engine interface the stage drives, and a small built-in
//! world implementing it.

pub mod body;
pub mod engine;
pub mod world;

pub use body::{Body, BodyHandle, BodyId, BodyProperties, BodyShape, BodySnapshot};
pub use engine::{BodyBuilder, PhysicsEngine, Runner};
pub use world::SimpleWorld;
