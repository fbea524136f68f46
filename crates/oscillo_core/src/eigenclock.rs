//! The "eigenvector clock": a unit hand `v(θ) = (cos θ, sin θ)` swept around
//! the circle together with its image `A v(θ)`. The hand and its image line up
//! exactly when `v` is an eigenvector of `A`.

use crate::error::{ensure_finite, OscilloError, Result};
use nalgebra::{Matrix2, Vector2};
use num_complex::Complex;
use std::f64::consts::TAU;

const IMAG_EPS: f64 = 1e-10;
const ANGLE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockHand {
    pub angle: f64,
    pub vector: [f64; 2],
    pub image: [f64; 2],
}

/// A clock angle at which the hand is an eigenvector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDirection {
    pub angle: f64,
    pub eigenvalue: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenClock {
    matrix: Matrix2<f64>,
}

impl Default for EigenClock {
    fn default() -> Self {
        Self {
            matrix: Matrix2::new(0.5, 1.5, 1.5, 0.5),
        }
    }
}

impl EigenClock {
    /// `rows` is row-major: `[[a, b], [c, d]]`.
    pub fn new(rows: [[f64; 2]; 2]) -> Result<Self> {
        for value in rows.iter().flatten() {
            ensure_finite("matrix", *value)?;
        }
        Ok(Self {
            matrix: Matrix2::new(rows[0][0], rows[0][1], rows[1][0], rows[1][1]),
        })
    }

    pub fn matrix(&self) -> &Matrix2<f64> {
        &self.matrix
    }

    pub fn vector(&self, angle: f64) -> [f64; 2] {
        [angle.cos(), angle.sin()]
    }

    pub fn image(&self, angle: f64) -> [f64; 2] {
        let mapped = self.matrix * Vector2::new(angle.cos(), angle.sin());
        [mapped.x, mapped.y]
    }

    pub fn hand(&self, angle: f64) -> ClockHand {
        ClockHand {
            angle,
            vector: self.vector(angle),
            image: self.image(angle),
        }
    }

    /// Hands at `samples` evenly spaced angles from `0` to `angle_end` inclusive.
    pub fn trace(&self, angle_end: f64, samples: usize) -> Result<Vec<ClockHand>> {
        ensure_finite("angle_end", angle_end)?;
        if samples < 2 {
            return Err(OscilloError::invalid(
                "samples",
                format!("must be at least 2, got {samples}"),
            ));
        }
        let step = angle_end / (samples - 1) as f64;
        Ok((0..samples)
            .map(|i| {
                let angle = if i + 1 == samples {
                    angle_end
                } else {
                    step * i as f64
                };
                self.hand(angle)
            })
            .collect())
    }

    pub fn eigenvalues(&self) -> Vec<Complex<f64>> {
        self.matrix.complex_eigenvalues().iter().copied().collect()
    }

    /// Clock angles in `[0, 2π)` where `v(θ)` is an eigenvector, ascending.
    ///
    /// Each real eigenvalue contributes both ends of its eigenvector line.
    /// Complex eigenvalues contribute nothing; a multiple of the identity has
    /// every direction as an eigenvector and reports the coordinate axes.
    pub fn eigen_directions(&self) -> Vec<EigenDirection> {
        let mut directions: Vec<EigenDirection> = Vec::new();
        for lambda in self.eigenvalues() {
            let scale = lambda.norm().max(1.0);
            if lambda.im.abs() > IMAG_EPS * scale {
                continue;
            }
            for base in self.eigenvector_angles(lambda.re) {
                for angle in [base, base + 0.5 * TAU] {
                    let angle = angle.rem_euclid(TAU);
                    let duplicate = directions.iter().any(|d| {
                        let gap = (d.angle - angle).abs();
                        gap.min(TAU - gap) < ANGLE_EPS
                    });
                    if !duplicate {
                        directions.push(EigenDirection {
                            angle,
                            eigenvalue: lambda.re,
                        });
                    }
                }
            }
        }
        directions.sort_by(|x, y| x.angle.total_cmp(&y.angle));
        directions
    }

    /// Angles of the eigenvector lines of `lambda`, from a null vector of `A - λI`.
    fn eigenvector_angles(&self, lambda: f64) -> Vec<f64> {
        let (a, b) = (self.matrix[(0, 0)], self.matrix[(0, 1)]);
        let (c, d) = (self.matrix[(1, 0)], self.matrix[(1, 1)]);
        let scale = self.matrix.abs().max().max(1.0);

        // Each row of A - λI is orthogonal to the null vector; use the larger row.
        let row_top = (a - lambda, b);
        let row_bottom = (c, d - lambda);
        let norm_top = row_top.0.hypot(row_top.1);
        let norm_bottom = row_bottom.0.hypot(row_bottom.1);
        let (p, q) = if norm_top >= norm_bottom {
            row_top
        } else {
            row_bottom
        };
        if p.hypot(q) <= IMAG_EPS * scale {
            return vec![0.0, 0.25 * TAU];
        }
        vec![p.atan2(-q)]
    }
}
