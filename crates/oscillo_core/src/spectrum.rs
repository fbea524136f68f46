//! Magnitude spectrum of a string as heard by a pickup at one position.

use crate::error::{ensure_positive, OscilloError, Result};
use crate::string::StringSynthesizer;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;
use tracing::debug;

/// Hann window for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f64 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - ((2.0 * PI * index as f64) / (size as f64 - 1.0)).cos())
}

/// One-sided amplitude spectrum. `frequencies[k] = k / duration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
}

impl Spectrum {
    /// Frequency of the strongest non-DC bin, if any.
    pub fn peak_frequency(&self) -> Option<f64> {
        self.magnitudes
            .iter()
            .enumerate()
            .skip(1)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(idx, _)| self.frequencies[idx])
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }
}

/// Samples `synth` at `position` for `t = i * duration / samples` and returns
/// bins `0..=samples/2`, scaled so a pure mode of amplitude `a` reads `a`.
pub fn pickup_spectrum(
    synth: &StringSynthesizer,
    position: f64,
    duration: f64,
    samples: usize,
    window: bool,
) -> Result<Spectrum> {
    ensure_positive("duration", duration)?;
    if samples < 2 {
        return Err(OscilloError::invalid(
            "samples",
            format!("must be at least 2, got {samples}"),
        ));
    }

    let dt = duration / samples as f64;
    let mut buffer = Vec::with_capacity(samples);
    let mut weight_sum = 0.0;
    for i in 0..samples {
        let weight = if window { hann_window(i, samples) } else { 1.0 };
        weight_sum += weight;
        let y = synth.displacement(i as f64 * dt, position)?;
        buffer.push(Complex::new(y * weight, 0.0));
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(samples);
    fft.process(&mut buffer);

    let bins = samples / 2 + 1;
    let magnitudes = buffer[..bins]
        .iter()
        .enumerate()
        .map(|(k, c)| {
            let one_sided = if k == 0 || 2 * k == samples { 1.0 } else { 2.0 };
            one_sided * c.norm() / weight_sum
        })
        .collect();
    let frequencies = (0..bins).map(|k| k as f64 / duration).collect();

    debug!(samples, duration, window, "pickup spectrum computed");
    Ok(Spectrum {
        frequencies,
        magnitudes,
    })
}
