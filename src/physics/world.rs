//! Built-in physics world
//!
//! Minimal engine used by the native binary, the browser binding and tests:
//! - Sequential body identities starting at 1
//! - Batch insertion in submission order
//! - Semi-implicit Euler integration under gravity with air damping
//!
//! Collision resolution belongs to a full engine and is not attempted here.

use std::cell::Cell;

use glam::Vec2;

use super::body::{Body, BodyHandle, BodyId, BodyProperties, BodyShape};
use super::engine::{BodyBuilder, PhysicsEngine};
use crate::consts::GRAVITY_SCALE;

/// In-process reference engine
#[derive(Debug)]
pub struct SimpleWorld {
    gravity: Vec2,
    bodies: Vec<BodyHandle>,
    next_id: Cell<u64>,
}

impl SimpleWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            gravity,
            bodies: Vec::new(),
            next_id: Cell::new(1),
        }
    }

    fn allocate_id(&self) -> BodyId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        BodyId(id)
    }

    fn build(&self, shape: BodyShape, position: Vec2, properties: &BodyProperties) -> BodyHandle {
        BodyHandle::new(Body::new(
            Some(self.allocate_id()),
            shape,
            position,
            properties.clone(),
        ))
    }
}

impl Default for SimpleWorld {
    fn default() -> Self {
        Self::new(Vec2::new(0.0, 1.0))
    }
}

impl BodyBuilder for SimpleWorld {
    fn circle(&self, position: Vec2, radius: f32, properties: &BodyProperties) -> BodyHandle {
        self.build(BodyShape::Circle { radius }, position, properties)
    }

    fn rectangle(
        &self,
        position: Vec2,
        width: f32,
        height: f32,
        properties: &BodyProperties,
    ) -> BodyHandle {
        self.build(BodyShape::Rectangle { width, height }, position, properties)
    }
}

impl PhysicsEngine for SimpleWorld {
    fn add_bodies(&mut self, bodies: Vec<BodyHandle>) {
        log::trace!("Adding {} bodies to world", bodies.len());
        self.bodies.extend(bodies);
    }

    fn bodies(&self) -> &[BodyHandle] {
        &self.bodies
    }

    fn step(&mut self, dt: f32) {
        let accel = self.gravity * GRAVITY_SCALE;
        for handle in &self.bodies {
            handle.update(|body| {
                if body.properties.is_static() {
                    return;
                }
                let damping = 1.0 - body.properties.friction_air();
                body.velocity = (body.velocity + accel * dt) * damping;
                body.position += body.velocity * dt;
            });
        }
    }

    fn clear(&mut self) {
        self.bodies.clear();
    }

    fn as_builder(&self) -> &dyn BodyBuilder {
        self
    }
}
