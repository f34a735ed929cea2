//! Render collaborator
//!
//! Drawing is owned by the host. The stage only points the camera, starts and
//! stops the render loop, and asks for a frame.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEFAULT_WORLD_SIZE;
use crate::physics::BodyHandle;

/// Axis-aligned camera region in world coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraBounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl CameraBounds {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Bounds anchored at the origin
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(width, height))
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }
}

impl Default for CameraBounds {
    fn default() -> Self {
        Self::from_size(DEFAULT_WORLD_SIZE, DEFAULT_WORLD_SIZE)
    }
}

/// A drawable target driven by the stage
pub trait RenderSurface {
    fn look_at(&mut self, bounds: CameraBounds);

    fn camera(&self) -> CameraBounds;

    /// Drawable size changed
    fn resize(&mut self, width: f32, height: f32);

    /// Start the render loop
    fn run(&mut self);

    /// Stop the render loop
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Draw one frame of the given bodies
    fn draw(&mut self, bodies: &[BodyHandle]);
}

/// Surface that records what it was asked to do
///
/// Used natively and in the browser, where the host reads body snapshots and
/// does the actual drawing.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    size: Vec2,
    camera: CameraBounds,
    running: bool,
    frames: u64,
    last_frame_bodies: usize,
}

impl HeadlessSurface {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Vec2::new(width, height),
            camera: CameraBounds::default(),
            running: false,
            frames: 0,
            last_frame_bodies: 0,
        }
    }

    /// Drawable size in pixels
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Frames drawn so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Body count in the most recent frame
    pub fn last_frame_bodies(&self) -> usize {
        self.last_frame_bodies
    }
}

impl RenderSurface for HeadlessSurface {
    fn look_at(&mut self, bounds: CameraBounds) {
        self.camera = bounds;
    }

    fn camera(&self) -> CameraBounds {
        self.camera
    }

    fn resize(&mut self, width: f32, height: f32) {
        self.size = Vec2::new(width, height);
    }

    fn run(&mut self) {
        self.running = true;
    }

    fn stop(&mut self) {
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }

    fn draw(&mut self, bodies: &[BodyHandle]) {
        if !self.running {
            return;
        }
        self.frames += 1;
        self.last_frame_bodies = bodies.len();
    }
}
