//! Equal-tempered fret geometry.
//!
//! Fret `n` shortens the vibrating part of a string to `2^(-n/12)` of the open
//! length, so every twelve frets halve it.

use crate::error::{ensure_positive, Result};
use serde::{Deserialize, Serialize};

pub const FRETS_PER_OCTAVE: u32 = 12;

/// Fraction of the open string left vibrating when fretted at `fret`.
pub fn fret_ratio(fret: u32) -> f64 {
    (-(fret as f64) / FRETS_PER_OCTAVE as f64).exp2()
}

/// Distance of `fret` from the nut on a string of `scale_length`.
pub fn fret_offset(scale_length: f64, fret: u32) -> Result<f64> {
    ensure_positive("scale_length", scale_length)?;
    Ok(scale_length * (1.0 - fret_ratio(fret)))
}

/// Vibrating length left when the string is fretted at `fret`.
pub fn effective_length(scale_length: f64, fret: u32) -> Result<f64> {
    Ok(scale_length - fret_offset(scale_length, fret)?)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FretPosition {
    pub number: u32,
    pub ratio: f64,
    pub log2: f64,
}

/// Frets `1..=count` with their ratios and base-2 logarithms.
pub fn fret_positions(count: u32) -> Vec<FretPosition> {
    (1..=count)
        .map(|number| {
            let ratio = fret_ratio(number);
            FretPosition {
                number,
                ratio,
                log2: ratio.log2(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_string_and_octave() {
        assert_eq!(fret_ratio(0), 1.0);
        assert!((fret_ratio(12) - 0.5).abs() < 1e-15);
        assert!((fret_ratio(24) - 0.25).abs() < 1e-15);
        assert_eq!(fret_offset(4.0, 0).unwrap(), 0.0);
        assert!((fret_offset(4.0, 12).unwrap() - 2.0).abs() < 1e-14);
    }

    #[test]
    fn second_fret_on_a_four_unit_neck() {
        let offset = fret_offset(4.0, 2).unwrap();
        assert!((offset - 0.436_414).abs() < 1e-5, "{offset}");
        let length = effective_length(4.0, 2).unwrap();
        assert!((length - 3.563_586).abs() < 1e-5, "{length}");
    }

    #[test]
    fn positions_carry_logarithms() {
        let positions = fret_positions(12);
        assert_eq!(positions.len(), 12);
        for pos in &positions {
            assert!((pos.log2 + pos.number as f64 / 12.0).abs() < 1e-14);
        }
        assert!((positions[11].ratio - 0.5).abs() < 1e-15);
        assert!(positions.windows(2).all(|w| w[1].ratio < w[0].ratio));
    }

    #[test]
    fn rejects_degenerate_scale_length() {
        assert!(fret_offset(0.0, 3).is_err());
        assert!(effective_length(f64::NAN, 3).is_err());
    }
}
