use crate::to_js_error;
use js_sys::Float64Array;
use oscillo_core::eigenclock::EigenClock;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmEigenClock {
    clock: EigenClock,
}

#[derive(Serialize)]
struct DirectionWire {
    angle: f64,
    eigenvalue: f64,
}

#[derive(Serialize)]
struct ComplexWire {
    re: f64,
    im: f64,
}

#[wasm_bindgen]
impl WasmEigenClock {
    /// `matrix` is row-major `[a, b, c, d]`; an empty array selects the default clock.
    #[wasm_bindgen(constructor)]
    pub fn new(matrix: Vec<f64>) -> Result<WasmEigenClock, JsValue> {
        console_error_panic_hook::set_once();

        let clock = match matrix.as_slice() {
            [] => EigenClock::default(),
            &[a, b, c, d] => EigenClock::new([[a, b], [c, d]]).map_err(to_js_error)?,
            _ => {
                return Err(JsValue::from_str(
                    "Matrix must have 4 entries in row-major order.",
                ))
            }
        };
        Ok(WasmEigenClock { clock })
    }

    /// `[vx, vy, avx, avy]` for the hand at `angle`.
    pub fn hand(&self, angle: f64) -> Float64Array {
        let hand = self.clock.hand(angle);
        Float64Array::from(
            [hand.vector[0], hand.vector[1], hand.image[0], hand.image[1]].as_slice(),
        )
    }

    /// Swept hands from `0` to `angle_end`, four values per hand as in [`Self::hand`].
    pub fn trace(&self, angle_end: f64, samples: usize) -> Result<Float64Array, JsValue> {
        let hands = self
            .clock
            .trace(angle_end, samples)
            .map_err(to_js_error)?;
        let flat: Vec<f64> = hands
            .iter()
            .flat_map(|h| [h.vector[0], h.vector[1], h.image[0], h.image[1]])
            .collect();
        Ok(Float64Array::from(flat.as_slice()))
    }

    pub fn eigen_directions(&self) -> Result<JsValue, JsValue> {
        let wire: Vec<DirectionWire> = self
            .clock
            .eigen_directions()
            .into_iter()
            .map(|d| DirectionWire {
                angle: d.angle,
                eigenvalue: d.eigenvalue,
            })
            .collect();
        to_value(&wire).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn eigenvalues(&self) -> Result<JsValue, JsValue> {
        let wire: Vec<ComplexWire> = self
            .clock
            .eigenvalues()
            .into_iter()
            .map(|l| ComplexWire { re: l.re, im: l.im })
            .collect();
        to_value(&wire).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
