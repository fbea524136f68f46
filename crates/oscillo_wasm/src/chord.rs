use crate::{flatten_points, to_js_error};
use js_sys::Float64Array;
use oscillo_core::chord::{Chord, ChordConfig, ChordName, GuitarString};
use oscillo_core::spectrum::pickup_spectrum;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct WasmChord {
    chord: Chord,
}

/// Per-string summary handed to JS.
#[derive(Serialize)]
struct StringInfo {
    string: &'static str,
    fret: u32,
    fret_offset: f64,
    effective_length: f64,
    coefficients: Vec<f64>,
    modal_frequencies: Vec<f64>,
}

#[derive(Serialize)]
struct SpectrumWire {
    frequencies: Vec<f64>,
    magnitudes: Vec<f64>,
    peak_frequency: Option<f64>,
}

fn parse_string(symbol: &str) -> Result<GuitarString, JsValue> {
    GuitarString::from_symbol(symbol)
        .ok_or_else(|| JsValue::from_str(&format!("Unknown string: {}", symbol)))
}

#[wasm_bindgen]
impl WasmChord {
    /// Assembles chord `name` ("Em", "G", "D", "A"). `config_val` may be
    /// `undefined` or a partial `ChordConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, config_val: JsValue) -> Result<WasmChord, JsValue> {
        console_error_panic_hook::set_once();

        let config: ChordConfig = if config_val.is_undefined() || config_val.is_null() {
            ChordConfig::default()
        } else {
            from_value(config_val)
                .map_err(|e| JsValue::from_str(&format!("Invalid chord config: {}", e)))?
        };
        let name: ChordName = name.parse().map_err(to_js_error)?;
        let chord = Chord::build(name, &config).map_err(to_js_error)?;
        Ok(WasmChord { chord })
    }

    /// Symbols of the sounding strings, low to high.
    pub fn strings(&self) -> Vec<String> {
        self.chord
            .iter()
            .map(|(string, _)| string.symbol().to_string())
            .collect()
    }

    pub fn string_info(&self, symbol: &str) -> Result<JsValue, JsValue> {
        let string = parse_string(symbol)?;
        let entry = self
            .chord
            .get(string)
            .ok_or_else(|| JsValue::from_str(&format!("String {} is muted", symbol)))?;
        let info = StringInfo {
            string: string.symbol(),
            fret: entry.fret,
            fret_offset: entry.fret_offset,
            effective_length: entry.effective_length,
            coefficients: entry.synthesizer.coefficients().to_vec(),
            modal_frequencies: entry.synthesizer.modal_frequencies(),
        };
        to_value(&info).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Displacement at neck coordinate `x`, or `undefined` for a muted string.
    pub fn displacement(&self, symbol: &str, t: f64, x: f64) -> Result<Option<f64>, JsValue> {
        let string = parse_string(symbol)?;
        self.chord
            .displacement_on_neck(string, t, x)
            .map_err(to_js_error)
    }

    /// String profile at `t` in local coordinates, flattened `x, y` pairs.
    pub fn profile(&self, symbol: &str, t: f64, samples: usize) -> Result<Float64Array, JsValue> {
        let string = parse_string(symbol)?;
        let entry = self
            .chord
            .get(string)
            .ok_or_else(|| JsValue::from_str(&format!("String {} is muted", symbol)))?;
        let points = entry
            .synthesizer
            .at(t)
            .and_then(|profile| profile.sample(samples))
            .map_err(to_js_error)?;
        Ok(Float64Array::from(flatten_points(&points).as_slice()))
    }

    pub fn spectrum(
        &self,
        symbol: &str,
        position: f64,
        duration: f64,
        samples: usize,
        window: bool,
    ) -> Result<JsValue, JsValue> {
        let string = parse_string(symbol)?;
        let entry = self
            .chord
            .get(string)
            .ok_or_else(|| JsValue::from_str(&format!("String {} is muted", symbol)))?;
        let spectrum = pickup_spectrum(&entry.synthesizer, position, duration, samples, window)
            .map_err(to_js_error)?;
        let wire = SpectrumWire {
            peak_frequency: spectrum.peak_frequency(),
            frequencies: spectrum.frequencies,
            magnitudes: spectrum.magnitudes,
        };
        to_value(&wire).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
