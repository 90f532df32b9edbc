#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::fmt;

use geom::{ConfigChange, HopfConfig, HopfScene};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// What an `update` call regenerated, as reported to JS.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateReport {
    base_points: bool,
    fibration: bool,
    tube: bool,
    reallocated: bool,
}

/// Hopf fibration scene exposed to JS.
///
/// Buffers are handed out as typed arrays: vertices interleaved as
/// `[px, py, pz, r, g, b, u, v]`, fiber indices separated by `restart_index()`.
#[wasm_bindgen]
pub struct HopfEngine {
    scene: HopfScene,
}

#[wasm_bindgen]
impl HopfEngine {
    /// Builds a scene from a JS config object, or the defaults when `config` is
    /// `undefined`/`null`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<HopfEngine, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            HopfConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js_error)?
        };
        Self::with_config(config).map_err(to_js_error)
    }

    /// The default configuration as a JS object.
    #[wasm_bindgen]
    pub fn default_config() -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&HopfConfig::default()).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// The active (sanitized) configuration.
    #[wasm_bindgen]
    pub fn config(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.scene.config()).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Applies a new configuration and reports which buffers changed.
    #[wasm_bindgen]
    pub fn update(&mut self, config: JsValue) -> Result<JsValue, JsValue> {
        let config: HopfConfig = serde_wasm_bindgen::from_value(config).map_err(to_js_error)?;
        let report = self.apply_config(config).map_err(to_js_error)?;
        serde_wasm_bindgen::to_value(&report).map_err(|err| JsError::new(&err.to_string()).into())
    }

    #[wasm_bindgen]
    pub fn base_point_vertices(&self) -> Vec<f32> {
        self.scene.base_points().interleaved()
    }

    #[wasm_bindgen]
    pub fn fibration_vertices(&self) -> Vec<f32> {
        self.scene.fibration_mesh().interleaved()
    }

    #[wasm_bindgen]
    pub fn fibration_indices(&self) -> Vec<u32> {
        self.scene.fibration_mesh().indices.clone()
    }

    #[wasm_bindgen]
    pub fn tube_vertices(&self) -> Option<Vec<f32>> {
        self.scene.tube().map(|tube| tube.to_mesh().interleaved())
    }

    #[wasm_bindgen]
    pub fn tube_indices(&self) -> Option<Vec<u32>> {
        self.scene.tube().map(|tube| tube.indices.clone())
    }

    #[wasm_bindgen]
    pub fn restart_index(&self) -> u32 {
        self.scene.config().restart_index
    }

    /// One-line summary of the last generation pass.
    #[wasm_bindgen]
    pub fn diagnostics(&self) -> String {
        self.scene.diagnostics().summary()
    }

    /// Fibers as OBJ polyline text.
    #[wasm_bindgen]
    pub fn export_obj(&self) -> Result<String, JsValue> {
        self.scene.fibration_obj().map_err(to_js_error)
    }
}

impl HopfEngine {
    /// Builds a scene without going through JS values.
    pub fn with_config(config: HopfConfig) -> Result<Self, String> {
        let scene = HopfScene::new(config).map_err(|err| err.to_string())?;
        debug_log!("hopf engine ready: {}", scene.diagnostics().summary());
        Ok(Self { scene })
    }

    #[must_use]
    pub fn scene(&self) -> &HopfScene {
        &self.scene
    }

    fn apply_config(&mut self, config: HopfConfig) -> Result<UpdateReport, String> {
        let update = self.scene.update(config).map_err(|err| err.to_string())?;
        let ConfigChange { base_points, fibration, tube } = update.change;
        let reallocated = [update.base_points, update.fibration]
            .into_iter()
            .flatten()
            .any(|u| u == geom::BufferUpdate::Reallocated);
        Ok(UpdateReport { base_points, fibration, tube, reallocated })
    }

    /// Native counterpart of [`update`](Self::update); returns whether any buffer
    /// had to be reallocated.
    pub fn update_config(&mut self, config: HopfConfig) -> Result<bool, String> {
        self.apply_config(config).map(|report| report.reallocated)
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
