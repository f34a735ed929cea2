//! Scene loading
//!
//! Turns a `SceneDescription` into bodies in the simulation world:
//! 1. Frame the camera on the scene's world size, if given
//! 2. Note compiler diagnostics
//! 3. Build every valid body through the shape registry, binding names
//! 4. Replace the world's bodies with the new batch in one insertion
//! 5. Draw a ready frame
//!
//! Bad body specs never fail a load; they are counted in the `LoadReport`.

use std::collections::HashMap;

use serde::Serialize;

use super::description::SceneDescription;
use super::registry::ShapeRegistry;
use crate::consts::{DEFAULT_WORLD_SIZE, UNBATCHED_INDEX};
use crate::error::{Result, StageError};
use crate::physics::BodyHandle;
use crate::render::CameraBounds;
use crate::sim::SimulationLifecycle;

/// Named bodies of the current scene
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: HashMap<String, BodyHandle>,
}

impl VariableTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name`; a later body with the same name replaces the earlier one
    pub fn bind(&mut self, name: impl Into<String>, body: BodyHandle) {
        self.vars.insert(name.into(), body);
    }

    pub fn get(&self, name: &str) -> Option<&BodyHandle> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Bound names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.vars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BodyHandle)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What a load did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Bodies committed to the world
    pub committed: usize,
    /// Entries skipped for missing `shape`/`position` or wrong field types
    pub dropped_specs: usize,
    /// Bodies built without an engine identity
    pub discarded_bodies: usize,
    /// Names in the variable table after the load
    pub bound_names: usize,
    /// Diagnostics carried by the scene
    pub compiler_errors: usize,
    /// Camera after the load
    pub camera: Option<CameraBounds>,
    /// Whether the scene carried a body list at all
    pub replaced_bodies: bool,
}

/// Interprets scene descriptions against a shape registry
#[derive(Debug, Default)]
pub struct SceneLoader {
    registry: ShapeRegistry,
    vars: VariableTable,
}

impl SceneLoader {
    pub fn new(registry: ShapeRegistry) -> Self {
        Self {
            registry,
            vars: VariableTable::new(),
        }
    }

    /// Register global shapes here
    pub fn registry_mut(&mut self) -> &mut ShapeRegistry {
        &mut self.registry
    }

    pub fn variables(&self) -> &VariableTable {
        &self.vars
    }

    /// Load `scene` into the lifecycle's world
    ///
    /// Fails only when the lifecycle is disposed, in which case nothing is
    /// touched. Without a `bodies` list the world and variables are kept.
    pub fn load(
        &mut self,
        scene: SceneDescription,
        lifecycle: &mut SimulationLifecycle,
    ) -> Result<LoadReport> {
        if lifecycle.is_disposed() {
            return Err(StageError::disposed("load"));
        }
        let mut report = LoadReport::default();

        if let Some(world) = scene.world {
            let width = world.width.filter(|w| *w != 0.0).unwrap_or(DEFAULT_WORLD_SIZE);
            let height = world.height.filter(|h| *h != 0.0).unwrap_or(DEFAULT_WORLD_SIZE);
            lifecycle
                .surface_mut()?
                .look_at(CameraBounds::from_size(width, height));
        }
        report.camera = Some(lifecycle.surface()?.camera());

        // Diagnostics are counted only; presenting them is the host's job
        report.compiler_errors = scene.errors().len();
        for error in scene.errors() {
            log::debug!("Scene diagnostic: {}", error.message().unwrap_or("<no message>"));
        }

        let Some(entries) = scene.bodies.as_deref() else {
            log::debug!("Scene has no body list, world left as is");
            return Ok(report);
        };

        let mut vars = VariableTable::new();
        let mut batch = Vec::with_capacity(entries.len());
        {
            let ctx = lifecycle.engine()?.as_builder();
            for entry in entries {
                let Some((spec, shape, position)) = entry.valid_spec() else {
                    report.dropped_specs += 1;
                    continue;
                };
                let factory = self.registry.resolve(scene.overrides(), shape);
                let body = factory.build(ctx, &spec.options)(position.x, position.y, UNBATCHED_INDEX);
                if let Some(name) = &spec.name {
                    vars.bind(name.as_str(), body.clone());
                }
                if body.id().is_some() {
                    batch.push(body);
                } else {
                    report.discarded_bodies += 1;
                }
            }
        }

        report.committed = batch.len();
        report.bound_names = vars.len();
        report.replaced_bodies = true;
        self.vars = vars;

        let engine = lifecycle.engine_mut()?;
        engine.clear();
        engine.add_bodies(batch);

        if report.dropped_specs > 0 {
            log::warn!("Dropped {} invalid body specs", report.dropped_specs);
        }
        log::debug!(
            "Loaded scene: {} bodies, {} names, {} discarded",
            report.committed,
            report.bound_names,
            report.discarded_bodies
        );

        lifecycle.ready()?;
        Ok(report)
    }
}
