//! Stage configuration
//!
//! Persisted in LocalStorage on the web, read from a JSON file natively.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, StageError};

/// Stage settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    // === Host surface ===
    /// Drawable width in pixels
    pub width: f32,
    /// Drawable height in pixels
    pub height: f32,
    /// Debug flag (stored for the host, not consumed by the stage)
    pub debug: bool,

    // === Compiler ===
    /// Endpoint that turns source text into a scene description
    pub compile_url: String,
    /// Request timeout in milliseconds
    pub compile_timeout_ms: u64,

    // === Physics ===
    /// Gravity for the built-in world, in multiples of `GRAVITY_SCALE`
    pub gravity: Vec2,
    /// Step size handed to the engine per tick (seconds)
    pub time_step: f32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_SURFACE_WIDTH,
            height: DEFAULT_SURFACE_HEIGHT,
            debug: false,

            compile_url: DEFAULT_COMPILE_URL.to_string(),
            compile_timeout_ms: COMPILE_TIMEOUT_MS,

            gravity: Vec2::new(0.0, 1.0),
            time_step: TIME_STEP,
        }
    }
}

impl StageConfig {
    /// Parse settings from JSON; missing keys take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the stage cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.width > 0.0 && self.height > 0.0) {
            return Err(StageError::Config(format!(
                "surface size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !(self.time_step > 0.0) {
            return Err(StageError::Config(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.compile_timeout_ms == 0 {
            return Err(StageError::Config("compile_timeout_ms must be non-zero".into()));
        }
        Ok(())
    }

    /// Compile timeout as a `Duration`
    pub fn compile_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.compile_timeout_ms)
    }

    /// Serialized form, as stored in LocalStorage
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// LocalStorage key
    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "scene_stage_config";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(config) => {
                        log::info!("Loaded stage config from LocalStorage");
                        return config;
                    }
                    Err(e) => log::warn!("Ignoring stored stage config: {}", e),
                }
            }
        }

        log::info!("Using default stage config");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            match self.to_json() {
                Ok(json) => {
                    let _ = storage.set_item(Self::STORAGE_KEY, &json);
                    log::info!("Stage config saved");
                }
                Err(e) => log::warn!("Could not save stage config: {}", e),
            }
        }
    }

    /// Native stub; native settings come from `load_from_path`
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    /// Read settings from a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| StageError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}
