//! Host-facing stage
//!
//! Bundles the lifecycle, the scene loader and the host surface settings into
//! the object a page or a CLI drives.

use crate::config::StageConfig;
use crate::error::Result;
use crate::physics::{BodyHandle, BodySnapshot, PhysicsEngine, SimpleWorld};
use crate::render::{CameraBounds, HeadlessSurface, RenderSurface};
use crate::scene::{LoadReport, SceneDescription, SceneLoader, ShapeRegistry, VariableTable};
use crate::sim::{LifecyclePhase, SimulationLifecycle};

/// A loadable, runnable simulation
#[derive(Debug)]
pub struct Stage {
    config: StageConfig,
    lifecycle: SimulationLifecycle,
    loader: SceneLoader,
}

impl Stage {
    /// Stage backed by the built-in world and a headless surface
    pub fn new(config: StageConfig) -> Self {
        let engine = Box::new(SimpleWorld::new(config.gravity));
        let surface = Box::new(HeadlessSurface::new(config.width, config.height));
        Self::with_parts(config, engine, surface)
    }

    /// Stage over caller-provided collaborators
    pub fn with_parts(
        config: StageConfig,
        engine: Box<dyn PhysicsEngine>,
        surface: Box<dyn RenderSurface>,
    ) -> Self {
        log::info!("Creating stage {}x{}", config.width, config.height);
        Self {
            lifecycle: SimulationLifecycle::new(engine, surface),
            loader: SceneLoader::new(ShapeRegistry::with_builtins()),
            config,
        }
    }

    /// Current settings, including size and debug changes made since creation
    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    // === Host surface ===

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn height(&self) -> f32 {
        self.config.height
    }

    /// Record a new drawable size and pass it to the surface, if still live
    pub fn set_window_size(&mut self, width: f32, height: f32) {
        self.config.width = width;
        self.config.height = height;
        if let Ok(surface) = self.lifecycle.surface_mut() {
            surface.resize(width, height);
        }
    }

    pub fn debug(&self) -> bool {
        self.config.debug
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.config.debug = debug;
    }

    // === Scene ===

    pub fn load(&mut self, scene: SceneDescription) -> Result<LoadReport> {
        self.loader.load(scene, &mut self.lifecycle)
    }

    /// Decode and load a scene from compiler JSON
    pub fn load_json(&mut self, json: &str) -> Result<LoadReport> {
        let scene = SceneDescription::from_json(json)?;
        self.load(scene)
    }

    pub fn registry_mut(&mut self) -> &mut ShapeRegistry {
        self.loader.registry_mut()
    }

    pub fn variables(&self) -> &VariableTable {
        self.loader.variables()
    }

    pub fn variable(&self, name: &str) -> Option<&BodyHandle> {
        self.loader.variables().get(name)
    }

    pub fn bodies(&self) -> Result<&[BodyHandle]> {
        Ok(self.lifecycle.engine()?.bodies())
    }

    /// Serializable view of every body in the world
    pub fn snapshot(&self) -> Result<Vec<BodySnapshot>> {
        Ok(self.bodies()?.iter().map(BodyHandle::snapshot).collect())
    }

    pub fn camera(&self) -> Result<CameraBounds> {
        Ok(self.lifecycle.surface()?.camera())
    }

    // === Lifecycle ===

    pub fn phase(&self) -> LifecyclePhase {
        self.lifecycle.phase()
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    pub fn lifecycle(&self) -> &SimulationLifecycle {
        &self.lifecycle
    }

    pub fn ready(&mut self) -> Result<()> {
        self.lifecycle.ready()
    }

    pub fn start(&mut self) -> Result<()> {
        self.lifecycle.start()
    }

    pub fn pause(&mut self) -> Result<()> {
        self.lifecycle.pause()
    }

    /// Advance one configured time step
    pub fn tick(&mut self) -> Result<bool> {
        self.lifecycle.tick(self.config.time_step)
    }

    /// Advance by an explicit `dt` (seconds)
    pub fn tick_by(&mut self, dt: f32) -> Result<bool> {
        self.lifecycle.tick(dt)
    }

    pub fn dispose(&mut self) {
        self.lifecycle.dispose();
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new(StageConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::BodyShape;
    use glam::Vec2;

    const SCENE: &str = r#"{
        "world": { "width": 500, "height": 400 },
        "bodies": [
            { "shape": "circle", "position": { "x": 10, "y": 20 }, "name": "ball", "restitution": 0.5 },
            { "shape": "rectangle", "position": { "x": 250, "y": 390 }, "width": 500, "height": 20,
              "isStatic": true, "name": "floor" },
            { "shape": "triangle", "position": { "x": 100, "y": 100 } }
        ],
        "errors": []
    }"#;

    #[test]
    fn test_window_size_and_debug() {
        let mut stage = Stage::default();
        assert_eq!((stage.width(), stage.height()), (800.0, 600.0));
        stage.set_window_size(1024.0, 768.0);
        assert_eq!((stage.width(), stage.height()), (1024.0, 768.0));

        assert!(!stage.debug());
        stage.set_debug(true);
        assert!(stage.debug());

        let saved = StageConfig::from_json(&stage.config().to_json().unwrap()).unwrap();
        assert_eq!((saved.width, saved.height, saved.debug), (1024.0, 768.0, true));

        stage.dispose();
        stage.set_window_size(10.0, 10.0);
        assert_eq!(stage.width(), 10.0);
    }

    #[test]
    fn test_load_json_and_run() {
        let mut stage = Stage::default();
        let report = stage.load_json(SCENE).unwrap();
        assert_eq!(report.committed, 3);
        assert_eq!(stage.camera().unwrap(), CameraBounds::from_size(500.0, 400.0));
        assert_eq!(stage.phase(), LifecyclePhase::Ready);

        let floor = stage.variable("floor").unwrap().clone();
        assert_eq!(floor.shape(), BodyShape::Rectangle { width: 500.0, height: 20.0 });

        stage.start().unwrap();
        for _ in 0..30 {
            assert!(stage.tick().unwrap());
        }
        let ball = stage.variable("ball").unwrap();
        assert!(ball.position().y > 20.0);
        assert_eq!(floor.position(), Vec2::new(250.0, 390.0));

        let snapshot = stage.snapshot().unwrap();
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[2].shape, BodyShape::Circle { radius: 25.0 });
    }

    #[test]
    fn test_bad_json_leaves_stage() {
        let mut stage = Stage::default();
        stage.load_json(SCENE).unwrap();
        assert!(stage.load_json("{ not json").is_err());
        assert_eq!(stage.variables().len(), 2);
        assert_eq!(stage.bodies().unwrap().len(), 3);
    }

    #[test]
    fn test_disposed_stage_refuses_work() {
        let mut stage = Stage::default();
        stage.load_json(SCENE).unwrap();
        stage.dispose();
        stage.dispose();

        assert_eq!(stage.phase(), LifecyclePhase::Disposed);
        assert!(stage.start().unwrap_err().is_disposed());
        assert!(stage.tick().unwrap_err().is_disposed());
        assert!(stage.load_json(SCENE).unwrap_err().is_disposed());
        assert!(stage.snapshot().is_err());
    }
}
