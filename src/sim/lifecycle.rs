//! Simulation lifecycle state machine
//!
//! `Constructed → Ready → Running ⇄ Paused → Disposed`
//!
//! Engine, runner and render surface live inside the state value, so once the
//! lifecycle is `Disposed` there is nothing left to act on. Every operation
//! other than `dispose` reports `StageError::Disposed` from then on.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StageError};
use crate::physics::{PhysicsEngine, Runner};
use crate::render::RenderSurface;

/// Observable lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecyclePhase {
    /// Resources created, nothing drawn, runner disabled
    Constructed,
    /// First frame drawn, physics not advancing
    Ready,
    /// Runner enabled, physics advances every tick
    Running,
    /// Runner disabled, frame still drawn
    Paused,
    /// Terminal; resources released
    Disposed,
}

/// Resources owned by a live simulation
struct SimResources {
    engine: Box<dyn PhysicsEngine>,
    runner: Runner,
    surface: Box<dyn RenderSurface>,
}

impl SimResources {
    /// Draw one frame and start both loops, leaving physics frozen
    fn ready_pass(&mut self) {
        self.runner.run();
        self.surface.run();
        self.surface.draw(self.engine.bodies());
        self.runner.enabled = false;
    }

    fn release(mut self) {
        self.runner.stop();
        self.engine.clear();
        self.surface.stop();
    }
}

enum State {
    Constructed(SimResources),
    Ready(SimResources),
    Running(SimResources),
    Paused(SimResources),
    Disposed,
}

/// Owns the running/paused/disposed state of one simulation
pub struct SimulationLifecycle {
    state: State,
}

impl SimulationLifecycle {
    /// Take ownership of an engine and a surface; the runner starts disabled
    pub fn new(engine: Box<dyn PhysicsEngine>, surface: Box<dyn RenderSurface>) -> Self {
        Self {
            state: State::Constructed(SimResources {
                engine,
                runner: Runner::new(),
                surface,
            }),
        }
    }

    pub fn phase(&self) -> LifecyclePhase {
        match self.state {
            State::Constructed(_) => LifecyclePhase::Constructed,
            State::Ready(_) => LifecyclePhase::Ready,
            State::Running(_) => LifecyclePhase::Running,
            State::Paused(_) => LifecyclePhase::Paused,
            State::Disposed => LifecyclePhase::Disposed,
        }
    }

    pub fn is_disposed(&self) -> bool {
        matches!(self.state, State::Disposed)
    }

    fn resources(&self, operation: &'static str) -> Result<&SimResources> {
        match &self.state {
            State::Constructed(res) | State::Ready(res) | State::Running(res) | State::Paused(res) => {
                Ok(res)
            }
            State::Disposed => Err(StageError::disposed(operation)),
        }
    }

    fn resources_mut(&mut self, operation: &'static str) -> Result<&mut SimResources> {
        match &mut self.state {
            State::Constructed(res) | State::Ready(res) | State::Running(res) | State::Paused(res) => {
                Ok(res)
            }
            State::Disposed => Err(StageError::disposed(operation)),
        }
    }

    pub fn engine(&self) -> Result<&dyn PhysicsEngine> {
        Ok(self.resources("engine")?.engine.as_ref())
    }

    pub fn engine_mut(&mut self) -> Result<&mut dyn PhysicsEngine> {
        Ok(self.resources_mut("engine")?.engine.as_mut())
    }

    pub fn surface(&self) -> Result<&dyn RenderSurface> {
        Ok(self.resources("surface")?.surface.as_ref())
    }

    pub fn surface_mut(&mut self) -> Result<&mut dyn RenderSurface> {
        Ok(self.resources_mut("surface")?.surface.as_mut())
    }

    pub fn runner(&self) -> Result<&Runner> {
        Ok(&self.resources("runner")?.runner)
    }

    /// Replace the state via `f`; refused once disposed
    fn transition(&mut self, operation: &'static str, f: impl FnOnce(State) -> State) -> Result<()> {
        if self.is_disposed() {
            return Err(StageError::disposed(operation));
        }
        let state = std::mem::replace(&mut self.state, State::Disposed);
        self.state = f(state);
        Ok(())
    }

    /// Draw a static frame without advancing physics
    ///
    /// Called after construction and after every scene load.
    pub fn ready(&mut self) -> Result<()> {
        self.transition("ready", |state| match state {
            State::Constructed(mut res)
            | State::Ready(mut res)
            | State::Running(mut res)
            | State::Paused(mut res) => {
                res.ready_pass();
                State::Ready(res)
            }
            State::Disposed => State::Disposed,
        })?;
        log::debug!("Simulation ready");
        Ok(())
    }

    /// Enable stepping; from `Constructed` the ready pass runs first
    pub fn start(&mut self) -> Result<()> {
        self.transition("start", |state| match state {
            State::Constructed(mut res) => {
                res.ready_pass();
                res.runner.enabled = true;
                State::Running(res)
            }
            State::Ready(mut res) | State::Paused(mut res) => {
                res.runner.enabled = true;
                State::Running(res)
            }
            running @ State::Running(_) => running,
            State::Disposed => State::Disposed,
        })?;
        log::debug!("Simulation running");
        Ok(())
    }

    /// Disable stepping; the current frame stays visible
    pub fn pause(&mut self) -> Result<()> {
        self.transition("pause", |state| match state {
            State::Running(mut res) => {
                res.runner.enabled = false;
                State::Paused(res)
            }
            other => other,
        })
    }

    /// Host frame callback: steps physics when running, then draws
    ///
    /// Returns whether the engine stepped.
    pub fn tick(&mut self, dt: f32) -> Result<bool> {
        let phase = self.phase();
        let res = self.resources_mut("tick")?;
        let stepped = match phase {
            LifecyclePhase::Running => res.runner.tick(res.engine.as_mut(), dt),
            _ => false,
        };
        if phase != LifecyclePhase::Constructed {
            res.surface.draw(res.engine.bodies());
        }
        Ok(stepped)
    }

    /// Stop the runner, clear the engine, stop rendering; safe to repeat
    pub fn dispose(&mut self) {
        match std::mem::replace(&mut self.state, State::Disposed) {
            State::Constructed(res) | State::Ready(res) | State::Running(res) | State::Paused(res) => {
                res.release();
                log::info!("Simulation disposed");
            }
            State::Disposed => log::debug!("Simulation already disposed"),
        }
    }
}

impl std::fmt::Debug for SimulationLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationLifecycle")
            .field("phase", &self.phase())
            .finish()
    }
}
