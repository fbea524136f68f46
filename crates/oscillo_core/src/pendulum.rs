//! Double pendulum of two identical rigid rods.
//!
//! The equations of motion follow from the Lagrangian (per unit `m·l²`)
//!
//! ```text
//! L = θ'² + ½φ'² + θ'φ' cos(θ − φ) + 2 (g/l) cos θ + (g/l) cos φ
//! ```
//!
//! where `θ` is the angle of the inner rod and `φ` the angle of the outer rod,
//! both measured from the downward vertical.

use crate::error::{ensure_finite, ensure_in_domain, ensure_positive, OscilloError, Result};
use crate::integrate::{integrate_dense, DenseSolution, IntegrationStats, IntegratorSettings};
use crate::traits::{DynamicalSystem, Scalar};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Trailing window of the outer-bob motion trail, in seconds.
pub const DEFAULT_TRAIL_WINDOW: f64 = 1.5;

/// Physical constants of the pendulum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PendulumParams {
    /// Length of each rod.
    pub length: f64,
    pub gravity: f64,
}

impl Default for PendulumParams {
    fn default() -> Self {
        Self {
            length: 2.0,
            gravity: 9.81,
        }
    }
}

impl PendulumParams {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("length", self.length)?;
        ensure_positive("gravity", self.gravity)?;
        Ok(())
    }

    fn gravity_over_length(&self) -> f64 {
        self.gravity / self.length
    }
}

/// Angles (radians) and angular velocities (rad/s) of both rods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PendulumState {
    pub theta: f64,
    pub theta_dot: f64,
    pub phi: f64,
    pub phi_dot: f64,
}

/// Cartesian positions of the pivot and both bobs, y pointing up.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BobPositions {
    pub pivot: [f64; 2],
    pub inner: [f64; 2],
    pub outer: [f64; 2],
}

impl PendulumState {
    pub fn new(theta: f64, theta_dot: f64, phi: f64, phi_dot: f64) -> Self {
        Self {
            theta,
            theta_dot,
            phi,
            phi_dot,
        }
    }

    fn from_slice(values: &[f64]) -> Self {
        Self::new(values[0], values[1], values[2], values[3])
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.theta, self.theta_dot, self.phi, self.phi_dot]
    }

    pub fn is_finite(&self) -> bool {
        self.to_array().iter().all(|v| v.is_finite())
    }

    /// Total mechanical energy per unit `m·l²`.
    pub fn energy(&self, params: &PendulumParams) -> f64 {
        let gl = params.gravity_over_length();
        let delta = self.theta - self.phi;
        self.theta_dot * self.theta_dot
            + 0.5 * self.phi_dot * self.phi_dot
            + self.theta_dot * self.phi_dot * delta.cos()
            - 2.0 * gl * self.theta.cos()
            - gl * self.phi.cos()
    }

    pub fn bob_positions(&self, params: &PendulumParams) -> BobPositions {
        let l = params.length;
        let inner = [l * self.theta.sin(), -l * self.theta.cos()];
        let outer = [inner[0] + l * self.phi.sin(), inner[1] - l * self.phi.cos()];
        BobPositions {
            pivot: [0.0, 0.0],
            inner,
            outer,
        }
    }
}

/// Euler-Lagrange vector field on `(θ, θ', φ, φ')`.
#[derive(Debug, Clone, Copy)]
pub struct DoublePendulum {
    gravity_over_length: f64,
}

impl DoublePendulum {
    pub fn new(params: &PendulumParams) -> Self {
        Self {
            gravity_over_length: params.gravity_over_length(),
        }
    }
}

impl<T: Scalar> DynamicalSystem<T> for DoublePendulum {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: T, x: &[T], out: &mut [T]) {
        let (theta, theta_dot, phi, phi_dot) = (x[0], x[1], x[2], x[3]);
        let gl = T::from_f64(self.gravity_over_length).unwrap_or_else(T::nan);
        let two = T::one() + T::one();

        let delta = theta - phi;
        let (sin_delta, cos_delta) = (delta.sin(), delta.cos());

        let r1 = phi_dot * (theta_dot - phi_dot) * sin_delta - theta_dot * phi_dot * sin_delta
            - two * gl * theta.sin();
        let r2 = theta_dot * (theta_dot - phi_dot) * sin_delta + theta_dot * phi_dot * sin_delta
            - gl * phi.sin();

        // 2 - cos² ≥ 1, never singular
        let denom = two - cos_delta * cos_delta;

        out[0] = theta_dot;
        out[1] = (r1 - r2 * cos_delta) / denom;
        out[2] = phi_dot;
        out[3] = (-r1 * cos_delta + two * r2) / denom;
    }
}

/// Builds [`PendulumSolution`]s for a fixed pendulum and integrator setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct PendulumSolver {
    params: PendulumParams,
    settings: IntegratorSettings,
}

impl PendulumSolver {
    pub fn new(params: PendulumParams, settings: IntegratorSettings) -> Result<Self> {
        params.validate()?;
        settings.validate()?;
        Ok(Self { params, settings })
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    pub fn solve(
        &self,
        theta0: f64,
        theta_dot0: f64,
        phi0: f64,
        phi_dot0: f64,
        sim_time: f64,
    ) -> Result<PendulumSolution> {
        self.solve_from(PendulumState::new(theta0, theta_dot0, phi0, phi_dot0), sim_time)
    }

    /// Integrates from `initial` over `[0, sim_time]`.
    pub fn solve_from(&self, initial: PendulumState, sim_time: f64) -> Result<PendulumSolution> {
        ensure_finite("theta0", initial.theta)?;
        ensure_finite("theta_dot0", initial.theta_dot)?;
        ensure_finite("phi0", initial.phi)?;
        ensure_finite("phi_dot0", initial.phi_dot)?;
        ensure_positive("sim_time", sim_time)?;

        let system = DoublePendulum::new(&self.params);
        let solution = integrate_dense(&system, (0.0, sim_time), &initial.to_array(), &self.settings)?;
        debug!(
            sim_time,
            steps = solution.stats().accepted,
            "double pendulum solved"
        );

        Ok(PendulumSolution {
            params: self.params,
            initial,
            solution,
        })
    }
}

/// Continuous-time pendulum trajectory on `[0, sim_time]`.
#[derive(Debug, Clone)]
pub struct PendulumSolution {
    params: PendulumParams,
    initial: PendulumState,
    solution: DenseSolution,
}

impl PendulumSolution {
    pub fn sim_time(&self) -> f64 {
        self.solution.t_span().1
    }

    pub fn params(&self) -> &PendulumParams {
        &self.params
    }

    pub fn initial(&self) -> PendulumState {
        self.initial
    }

    pub fn stats(&self) -> IntegrationStats {
        self.solution.stats()
    }

    /// Times of the integrator's accepted steps.
    pub fn step_times(&self) -> Vec<f64> {
        self.solution.step_times()
    }

    pub fn state(&self, t: f64) -> Result<PendulumState> {
        let mut out = [0.0; 4];
        self.solution.sample_into(t, &mut out)?;
        Ok(PendulumState::from_slice(&out))
    }

    pub fn theta(&self, t: f64) -> Result<f64> {
        Ok(self.state(t)?.theta)
    }

    pub fn phi(&self, t: f64) -> Result<f64> {
        Ok(self.state(t)?.phi)
    }

    pub fn bob_positions(&self, t: f64) -> Result<BobPositions> {
        Ok(self.state(t)?.bob_positions(&self.params))
    }

    /// Outer-bob positions sampled evenly over `[max(0, t_end - window), t_end]`.
    pub fn trail(&self, t_end: f64, window: f64, samples: usize) -> Result<Vec<[f64; 2]>> {
        ensure_in_domain("t_end", t_end, 0.0, self.sim_time())?;
        ensure_positive("window", window)?;
        if samples < 2 {
            return Err(OscilloError::invalid(
                "samples",
                format!("must be at least 2, got {samples}"),
            ));
        }
        let t_start = (t_end - window).max(0.0);
        let step = (t_end - t_start) / (samples - 1) as f64;
        (0..samples)
            .map(|i| {
                let t = if i + 1 == samples {
                    t_end
                } else {
                    t_start + step * i as f64
                };
                Ok(self.bob_positions(t)?.outer)
            })
            .collect()
    }
}
