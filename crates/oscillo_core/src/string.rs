//! Vibrating string fixed at both ends.
//!
//! The initial deflection is projected onto the sine basis of `[0, L]` once;
//! afterwards the displacement at any `(t, x)` is a truncated Fourier sum with
//! a Gaussian-in-time envelope `exp(-gamma * t^2)`.

use crate::error::{
    ensure_finite, ensure_in_domain, ensure_non_negative, ensure_positive, OscilloError, Result,
};
use crate::quadrature::{integrate, QuadratureSettings};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::debug;

/// Length, propagation speed, series order and damping of a string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StringConfig {
    pub length: f64,
    pub wave_speed: f64,
    pub order: usize,
    pub gamma: f64,
}

impl Default for StringConfig {
    fn default() -> Self {
        Self {
            length: PI,
            wave_speed: 1.0,
            order: 1,
            gamma: 0.0,
        }
    }
}

impl StringConfig {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("length", self.length)?;
        ensure_positive("wave_speed", self.wave_speed)?;
        if self.order < 1 {
            return Err(OscilloError::invalid("order", "must be at least 1"));
        }
        ensure_non_negative("gamma", self.gamma)?;
        Ok(())
    }
}

/// Initial deflection of a plucked string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum PluckShape {
    /// Straight lines from both ends up to `peak` at `distance` from the right end.
    Triangle { distance: f64, peak: f64 },
    /// Narrow three-segment bump of half-width `0.2 L` centred `distance` from
    /// the right end, flat zero elsewhere. Chord assembly never uses it.
    Bump { distance: f64, peak: f64 },
}

impl PluckShape {
    pub fn validate(&self, length: f64) -> Result<()> {
        let (distance, peak) = match *self {
            PluckShape::Triangle { distance, peak } | PluckShape::Bump { distance, peak } => {
                (distance, peak)
            }
        };
        ensure_positive("distance", distance)?;
        if distance >= length {
            return Err(OscilloError::invalid(
                "distance",
                format!("must be shorter than the string length {length}, got {distance}"),
            ));
        }
        if !peak.is_finite() {
            return Err(OscilloError::invalid("peak", format!("must be finite, got {peak}")));
        }
        Ok(())
    }

    /// Deflection at `x` on a string of length `length`.
    pub fn evaluate(&self, length: f64, x: f64) -> f64 {
        match *self {
            PluckShape::Triangle { distance, peak } => {
                if x <= length - distance {
                    peak * x / (length - distance)
                } else {
                    -(peak / distance) * (x - length)
                }
            }
            PluckShape::Bump { distance, peak } => {
                let eps = 0.2 * length;
                let apex = length - distance;
                if x <= apex - eps {
                    0.0
                } else if x <= apex {
                    peak * (x - (apex - eps)) / eps
                } else if x <= apex + eps {
                    -(peak / eps) * x + (peak / eps) * (apex + eps)
                } else {
                    0.0
                }
            }
        }
    }
}

/// Truncated sine series of a string's motion.
#[derive(Debug, Clone, PartialEq)]
pub struct StringSynthesizer {
    config: StringConfig,
    coefficients: Vec<f64>,
}

impl StringSynthesizer {
    pub fn build<F: Fn(f64) -> f64>(initial_shape: F, config: StringConfig) -> Result<Self> {
        Self::build_with(initial_shape, config, &QuadratureSettings::default())
    }

    /// Projects `initial_shape` onto modes `1..=order` with the given quadrature settings.
    pub fn build_with<F: Fn(f64) -> f64>(
        initial_shape: F,
        config: StringConfig,
        quadrature: &QuadratureSettings,
    ) -> Result<Self> {
        config.validate()?;
        let l = config.length;
        let coefficients = (1..=config.order)
            .map(|k| -> Result<f64> {
                let wavenumber = PI * k as f64 / l;
                let projection = integrate(
                    |x| (wavenumber * x).sin() * initial_shape(x),
                    0.0,
                    l,
                    quadrature,
                )?;
                Ok(2.0 / l * projection.value)
            })
            .collect::<Result<Vec<f64>>>()?;

        debug!(order = config.order, length = l, "string coefficients computed");
        Ok(Self {
            config,
            coefficients,
        })
    }

    pub fn from_pluck(shape: PluckShape, config: StringConfig) -> Result<Self> {
        shape.validate(config.length)?;
        let length = config.length;
        Self::build(move |x| shape.evaluate(length, x), config)
    }

    /// String plucked at distance `d` from the right end with peak deflection `m`.
    pub fn get_string(
        d: f64,
        m: f64,
        length: f64,
        wave_speed: f64,
        order: usize,
        gamma: f64,
    ) -> Result<Self> {
        Self::from_pluck(
            PluckShape::Triangle {
                distance: d,
                peak: m,
            },
            StringConfig {
                length,
                wave_speed,
                order,
                gamma,
            },
        )
    }

    pub fn config(&self) -> &StringConfig {
        &self.config
    }

    pub fn length(&self) -> f64 {
        self.config.length
    }

    /// Coefficients of modes `1..=order`, in order.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Temporal frequencies `k c / (2 L)` of the retained modes.
    pub fn modal_frequencies(&self) -> Vec<f64> {
        (1..=self.config.order)
            .map(|k| k as f64 * self.config.wave_speed / (2.0 * self.config.length))
            .collect()
    }

    /// Displacement profile at time `t ≥ 0`.
    pub fn at(&self, t: f64) -> Result<StringProfile<'_>> {
        ensure_finite("t", t)?;
        ensure_in_domain("t", t, 0.0, f64::INFINITY)?;
        let l = self.config.length;
        let envelope = (-self.config.gamma * t * t).exp();
        let amplitudes = self
            .coefficients
            .iter()
            .enumerate()
            .map(|(idx, coeff)| {
                let k = (idx + 1) as f64;
                coeff * (PI * k * self.config.wave_speed * t / l).cos() * envelope
            })
            .collect();
        Ok(StringProfile {
            synth: self,
            t,
            amplitudes,
        })
    }

    pub fn displacement(&self, t: f64, x: f64) -> Result<f64> {
        self.at(t)?.displacement(x)
    }
}

/// Shape of a string frozen at one instant.
#[derive(Debug, Clone)]
pub struct StringProfile<'a> {
    synth: &'a StringSynthesizer,
    t: f64,
    amplitudes: Vec<f64>,
}

impl StringProfile<'_> {
    pub fn time(&self) -> f64 {
        self.t
    }

    /// Displacement at `x ∈ [0, L]`.
    pub fn displacement(&self, x: f64) -> Result<f64> {
        let l = self.synth.config.length;
        ensure_in_domain("x", x, 0.0, l)?;
        Ok(self
            .amplitudes
            .iter()
            .enumerate()
            .map(|(idx, amplitude)| amplitude * (PI * (idx + 1) as f64 * x / l).sin())
            .sum())
    }

    /// `samples` evenly spaced `(x, y)` points from `x = 0` to `x = L`.
    pub fn sample(&self, samples: usize) -> Result<Vec<[f64; 2]>> {
        if samples < 2 {
            return Err(OscilloError::invalid(
                "samples",
                format!("must be at least 2, got {samples}"),
            ));
        }
        let l = self.synth.config.length;
        (0..samples)
            .map(|i| {
                let x = if i + 1 == samples {
                    l
                } else {
                    l * i as f64 / (samples - 1) as f64
                };
                Ok([x, self.displacement(x)?])
            })
            .collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn fixed_ends_hold_for_any_time(
            t in 0.0_f64..20.0,
            order in 1_usize..24,
            gamma in 0.0_f64..1.0,
            d in 0.1_f64..3.9,
        ) {
            let synth = StringSynthesizer::get_string(d, 0.6, 4.0, 1.5, order, gamma).unwrap();
            let profile = synth.at(t).unwrap();
            prop_assert_eq!(profile.displacement(0.0).unwrap(), 0.0);
            prop_assert!(profile.displacement(4.0).unwrap().abs() < 1e-12);
        }

        #[test]
        fn displacement_never_exceeds_coefficient_mass(
            t in 0.0_f64..10.0,
            x in 0.0_f64..4.0,
        ) {
            let synth = StringSynthesizer::get_string(0.5, 0.6, 4.0, 1.5, 6, 0.125).unwrap();
            let bound: f64 = synth.coefficients().iter().map(|c| c.abs()).sum();
            let y = synth.displacement(t, x).unwrap();
            prop_assert!(y.abs() <= bound + 1e-12);
        }
    }
}
