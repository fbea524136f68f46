use crate::{flatten_points, to_js_error};
use js_sys::Float64Array;
use oscillo_core::integrate::IntegratorSettings;
use oscillo_core::pendulum::{PendulumParams, PendulumSolution, PendulumSolver};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmPendulum {
    solution: PendulumSolution,
}

#[wasm_bindgen]
impl WasmPendulum {
    /// Solves the double pendulum once over `[0, sim_time]`.
    ///
    /// `params_val` and `settings_val` may be `undefined` to use the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(
        theta0: f64,
        theta_dot0: f64,
        phi0: f64,
        phi_dot0: f64,
        sim_time: f64,
        params_val: JsValue,
        settings_val: JsValue,
    ) -> Result<WasmPendulum, JsValue> {
        console_error_panic_hook::set_once();

        let params: PendulumParams = if params_val.is_undefined() || params_val.is_null() {
            PendulumParams::default()
        } else {
            from_value(params_val)
                .map_err(|e| JsValue::from_str(&format!("Invalid pendulum params: {}", e)))?
        };
        let settings: IntegratorSettings = if settings_val.is_undefined() || settings_val.is_null()
        {
            IntegratorSettings::default()
        } else {
            from_value(settings_val)
                .map_err(|e| JsValue::from_str(&format!("Invalid integrator settings: {}", e)))?
        };

        let solver = PendulumSolver::new(params, settings).map_err(to_js_error)?;
        let solution = solver
            .solve(theta0, theta_dot0, phi0, phi_dot0, sim_time)
            .map_err(to_js_error)?;
        Ok(WasmPendulum { solution })
    }

    pub fn sim_time(&self) -> f64 {
        self.solution.sim_time()
    }

    pub fn theta(&self, t: f64) -> Result<f64, JsValue> {
        self.solution.theta(t).map_err(to_js_error)
    }

    pub fn phi(&self, t: f64) -> Result<f64, JsValue> {
        self.solution.phi(t).map_err(to_js_error)
    }

    /// `[theta, theta_dot, phi, phi_dot]` at `t`.
    pub fn state(&self, t: f64) -> Result<Float64Array, JsValue> {
        let state = self.solution.state(t).map_err(to_js_error)?;
        Ok(Float64Array::from(state.to_array().as_slice()))
    }

    pub fn energy(&self, t: f64) -> Result<f64, JsValue> {
        let state = self.solution.state(t).map_err(to_js_error)?;
        Ok(state.energy(self.solution.params()))
    }

    /// `{ pivot, inner, outer }` as `[x, y]` pairs.
    pub fn bob_positions(&self, t: f64) -> Result<JsValue, JsValue> {
        let bobs = self.solution.bob_positions(t).map_err(to_js_error)?;
        to_value(&bobs).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Outer bob positions over the trailing window, flattened `x, y` pairs.
    pub fn trail(&self, t_end: f64, window: f64, samples: usize) -> Result<Float64Array, JsValue> {
        let points = self
            .solution
            .trail(t_end, window, samples)
            .map_err(to_js_error)?;
        Ok(Float64Array::from(flatten_points(&points).as_slice()))
    }

    pub fn stats(&self) -> Result<JsValue, JsValue> {
        to_value(&self.solution.stats())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
