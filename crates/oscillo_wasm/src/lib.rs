//! Browser bindings for `oscillo_core`. Each engine is wrapped in a class that
//! owns the immutable core object and answers sampling queries from JS.

mod chord;
mod eigenclock;
mod pendulum;

pub use chord::WasmChord;
pub use eigenclock::WasmEigenClock;
pub use pendulum::WasmPendulum;

use oscillo_core::OscilloError;
use wasm_bindgen::prelude::*;

pub(crate) fn to_js_error(err: OscilloError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Flattens `[x, y]` pairs into `[x0, y0, x1, y1, ...]`.
pub(crate) fn flatten_points(points: &[[f64; 2]]) -> Vec<f64> {
    points.iter().flat_map(|p| p.iter().copied()).collect()
}
