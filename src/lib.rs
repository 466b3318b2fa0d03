#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod shadow;

use shadow::{ShadowVolumeInput, ShadowVolumeOptions};
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
fn init_logger() {}

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
        .map_err(|err| JsError::new(&format!("could not initialize rayon thread pool: {err}")))
}

/// Computes the shadow volume for a plain JS `ShadowVolumeInput` object.
///
/// `options` may be `undefined`/`null` for defaults; missing fields also default.
/// Returns `{ points, cubes, wall_points, diagnostics }`.
#[wasm_bindgen(js_name = computeShadowVolume)]
pub fn compute_shadow_volume(input: JsValue, options: JsValue) -> Result<JsValue, JsError> {
    let input: ShadowVolumeInput = serde_wasm_bindgen::from_value(input)
        .map_err(|err| JsError::new(&format!("invalid shadow volume input: {err}")))?;
    let options: ShadowVolumeOptions = if options.is_undefined() || options.is_null() {
        ShadowVolumeOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|err| JsError::new(&format!("invalid shadow volume options: {err}")))?
    };

    let volume = shadow::compute_shadow_volume(&input, &options)
        .map_err(|err| JsError::new(&err.to_string()))?;
    log::debug!(
        "computeShadowVolume: {} of {} samples survive",
        volume.diagnostics.survivor_count,
        volume.diagnostics.sample_count
    );

    serde_wasm_bindgen::to_value(&volume).map_err(|err| JsError::new(&err.to_string()))
}
