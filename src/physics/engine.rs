//! Physics engine interface and stepping runner
//!
//! The engine does the physics; the stage only builds bodies, commits them in
//! batches, and toggles whether the runner is allowed to step.

use glam::Vec2;

use super::body::{BodyHandle, BodyProperties};

/// Constructs bodies without inserting them into the world
///
/// Builders assign identities; a handle whose `id()` is `None` means
/// construction failed and the body must not be committed.
pub trait BodyBuilder {
    fn circle(&self, position: Vec2, radius: f32, properties: &BodyProperties) -> BodyHandle;

    fn rectangle(
        &self,
        position: Vec2,
        width: f32,
        height: f32,
        properties: &BodyProperties,
    ) -> BodyHandle;
}

/// A physics world the stage can populate and step
pub trait PhysicsEngine: BodyBuilder {
    /// Insert a batch of bodies in one operation
    fn add_bodies(&mut self, bodies: Vec<BodyHandle>);

    /// Bodies currently in the world, in insertion order
    fn bodies(&self) -> &[BodyHandle];

    /// Advance the world by `dt` seconds
    fn step(&mut self, dt: f32);

    /// Drop every body and reset internal state
    fn clear(&mut self);

    /// Upcast for callers that only need to build bodies
    fn as_builder(&self) -> &dyn BodyBuilder;
}

/// Gates engine stepping
///
/// `run` starts the stepping loop, `enabled` decides whether a started loop
/// actually advances physics on a tick.
#[derive(Debug, Clone, Default)]
pub struct Runner {
    running: bool,
    pub enabled: bool,
    ticks: u64,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the stepping loop (enabled)
    pub fn run(&mut self) {
        self.running = true;
        self.enabled = true;
    }

    /// Stop the stepping loop
    pub fn stop(&mut self) {
        self.running = false;
        self.enabled = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Steps performed so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Step the engine once if running and enabled; returns whether it stepped
    pub fn tick(&mut self, engine: &mut dyn PhysicsEngine, dt: f32) -> bool {
        if !(self.running && self.enabled) {
            return false;
        }
        engine.step(dt);
        self.ticks += 1;
        true
    }
}
