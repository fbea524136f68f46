#![cfg(target_arch = "wasm32")]

use oscillo_wasm::{WasmChord, WasmEigenClock, WasmPendulum};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn pendulum_starts_at_its_initial_angles() {
    let theta0 = 120f64.to_radians();
    let phi0 = (-90f64).to_radians();
    let pendulum = WasmPendulum::new(
        theta0,
        0.0,
        phi0,
        0.0,
        2.0,
        JsValue::UNDEFINED,
        JsValue::UNDEFINED,
    )
    .expect("pendulum solves");
    assert_eq!(pendulum.theta(0.0).expect("t = 0"), theta0);
    assert_eq!(pendulum.phi(0.0).expect("t = 0"), phi0);
    assert!(pendulum.theta(3.0).is_err());
}

#[wasm_bindgen_test]
fn chord_lists_sounding_strings() {
    let chord = WasmChord::new("A", JsValue::UNDEFINED).expect("chord");
    assert_eq!(chord.strings(), vec!["A", "D", "G", "B", "e"]);
    assert_eq!(chord.displacement("E", 0.0, 1.0).expect("muted"), None);
    assert!(WasmChord::new("Z", JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn eigen_clock_rejects_bad_matrices() {
    assert!(WasmEigenClock::new(vec![]).is_ok());
    assert!(WasmEigenClock::new(vec![1.0, 2.0, 3.0]).is_err());
    let hand = WasmEigenClock::new(vec![]).expect("default").hand(0.0);
    assert_eq!(hand.to_vec(), vec![1.0, 0.0, 0.5, 1.5]);
}
