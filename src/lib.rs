#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use geom::{MeshOutput, MeshedSurface, TwistedRibbon};
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

#[derive(Debug, Serialize)]
struct MeshResponse {
    #[serde(flatten)]
    mesh: MeshOutput,
    summary: String,
}

/// Meshes a twisted ribbon at target edge length `ds` and returns
/// `{ vertices, faces, enclosed, summary }`.
#[wasm_bindgen]
pub fn mesh_twisted_ribbon(radius: f64, width: f64, twists: f64, ds: f64) -> Result<JsValue, JsValue> {
    let ribbon = TwistedRibbon::new(radius, width, twists).map_err(|err| JsError::new(&err))?;
    let mut surface = MeshedSurface::from_surface(ribbon);
    surface
        .ensure_triangulated_for(ds, None)
        .map_err(|err| JsError::new(&err.to_string()))?;

    let response = MeshResponse {
        mesh: surface.output(),
        summary: surface
            .diagnostics()
            .map(geom::MeshBuildDiagnostics::summary)
            .unwrap_or_default(),
    };
    serde_wasm_bindgen::to_value(&response).map_err(|err| JsError::new(&err.to_string()).into())
}
