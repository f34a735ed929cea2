//! Browser binding
//!
//! Exposes a `Stage` to JavaScript. The page owns the canvas and draws from
//! `bodiesJson()`; it calls `tick` from its animation frame.

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::compile::{CompileClient, HttpTransport};
use crate::config::StageConfig;
use crate::stage::Stage;

#[wasm_bindgen(start)]
pub fn wasm_start() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    log::info!("Scene stage (web) starting...");
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Resolve a page-relative endpoint against the current origin
fn absolute_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        return url.to_string();
    }
    let origin = web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default();
    format!("{}{}", origin, url)
}

#[wasm_bindgen]
pub struct WebStage {
    stage: Rc<RefCell<Stage>>,
    client: Option<Rc<CompileClient<HttpTransport>>>,
}

#[wasm_bindgen]
impl WebStage {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> WebStage {
        let mut config = StageConfig::load();
        config.width = width;
        config.height = height;

        let client = match HttpTransport::new(&absolute_url(&config.compile_url), config.compile_timeout()) {
            Ok(transport) => Some(Rc::new(CompileClient::new(transport))),
            Err(e) => {
                log::warn!("Compiling disabled: {}", e);
                None
            }
        };

        WebStage {
            stage: Rc::new(RefCell::new(Stage::new(config))),
            client,
        }
    }

    #[wasm_bindgen(js_name = getWidth)]
    pub fn width(&self) -> f32 {
        self.stage.borrow().width()
    }

    #[wasm_bindgen(js_name = getHeight)]
    pub fn height(&self) -> f32 {
        self.stage.borrow().height()
    }

    pub fn set_window_size(&self, width: f32, height: f32) {
        let mut stage = self.stage.borrow_mut();
        stage.set_window_size(width, height);
        stage.config().save();
    }

    #[wasm_bindgen(js_name = getDebug)]
    pub fn debug(&self) -> bool {
        self.stage.borrow().debug()
    }

    #[wasm_bindgen(js_name = setDebug)]
    pub fn set_debug(&self, debug: bool) {
        let mut stage = self.stage.borrow_mut();
        stage.set_debug(debug);
        stage.config().save();
    }

    /// Load a scene from JSON; returns the load report as JSON
    pub fn load(&self, json: &str) -> Result<String, JsValue> {
        let report = self.stage.borrow_mut().load_json(json).map_err(js_err)?;
        serde_json::to_string(&report).map_err(js_err)
    }

    /// Send source to the compiler and load the result when it arrives
    pub fn compile(&self, source: String) {
        let Some(client) = self.client.clone() else {
            log::error!("No compile endpoint configured");
            return;
        };
        let stage = self.stage.clone();
        wasm_bindgen_futures::spawn_local(async move {
            client.compile(&source, &stage).await;
        });
    }

    pub fn ready(&self) -> Result<(), JsValue> {
        self.stage.borrow_mut().ready().map_err(js_err)
    }

    pub fn start(&self) -> Result<(), JsValue> {
        self.stage.borrow_mut().start().map_err(js_err)
    }

    pub fn pause(&self) -> Result<(), JsValue> {
        self.stage.borrow_mut().pause().map_err(js_err)
    }

    /// Advance by `dt` seconds; returns whether physics stepped
    pub fn tick(&self, dt: f32) -> Result<bool, JsValue> {
        self.stage.borrow_mut().tick_by(dt).map_err(js_err)
    }

    pub fn dispose(&self) {
        self.stage.borrow_mut().dispose();
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.stage.borrow().phase())
    }

    #[wasm_bindgen(js_name = bodiesJson)]
    pub fn bodies_json(&self) -> Result<String, JsValue> {
        let snapshot = self.stage.borrow().snapshot().map_err(js_err)?;
        serde_json::to_string(&snapshot).map_err(js_err)
    }
}
