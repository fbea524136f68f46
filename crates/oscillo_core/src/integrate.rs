//! Adaptive integration with dense output.
//!
//! [`integrate_dense`] drives a [`DormandPrince54`] stepper across a time span
//! with error-controlled step sizes and records every accepted step as a cubic
//! Hermite segment. The resulting [`DenseSolution`] can be sampled at any time
//! inside the span, not only at the step points.

use crate::error::{ensure_finite, ensure_in_domain, ensure_positive, OscilloError, Result};
use crate::solvers::DormandPrince54;
use crate::traits::{DynamicalSystem, EmbeddedStepper};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

const SAFETY: f64 = 0.9;
const MIN_FACTOR: f64 = 0.2;
const MAX_FACTOR: f64 = 10.0;

/// Settings controlling the adaptive integrator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IntegratorSettings {
    pub rtol: f64,
    pub atol: f64,
    pub max_steps: usize,
    /// Upper bound on the step size; unbounded when absent.
    pub max_step: Option<f64>,
    /// Initial step size; chosen automatically when absent.
    pub first_step: Option<f64>,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            rtol: 1e-8,
            atol: 1e-10,
            max_steps: 100_000,
            max_step: None,
            first_step: None,
        }
    }
}

impl IntegratorSettings {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("rtol", self.rtol)?;
        ensure_positive("atol", self.atol)?;
        if self.max_steps == 0 {
            return Err(OscilloError::invalid("max_steps", "must be greater than zero"));
        }
        if let Some(max_step) = self.max_step {
            ensure_positive("max_step", max_step)?;
        }
        if let Some(first_step) = self.first_step {
            ensure_positive("first_step", first_step)?;
        }
        Ok(())
    }
}

/// Step counters of a finished integration.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntegrationStats {
    pub accepted: usize,
    pub rejected: usize,
    pub evaluations: usize,
}

#[derive(Debug, Clone)]
struct HermiteSegment {
    t0: f64,
    t1: f64,
    y0: Vec<f64>,
    y1: Vec<f64>,
    f0: Vec<f64>,
    f1: Vec<f64>,
}

impl HermiteSegment {
    fn evaluate(&self, t: f64, out: &mut [f64]) {
        let h = self.t1 - self.t0;
        let s = (t - self.t0) / h;
        let s2 = s * s;
        let s3 = s2 * s;
        let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
        let h10 = s3 - 2.0 * s2 + s;
        let h01 = -2.0 * s3 + 3.0 * s2;
        let h11 = s3 - s2;
        for i in 0..out.len() {
            out[i] = h00 * self.y0[i]
                + h10 * h * self.f0[i]
                + h01 * self.y1[i]
                + h11 * h * self.f1[i];
        }
    }
}

/// Continuous solution of an initial value problem over `[t_start, t_end]`.
#[derive(Debug, Clone)]
pub struct DenseSolution {
    dimension: usize,
    t_start: f64,
    t_end: f64,
    segments: Vec<HermiteSegment>,
    stats: IntegrationStats,
}

impl DenseSolution {
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn t_span(&self) -> (f64, f64) {
        (self.t_start, self.t_end)
    }

    pub fn stats(&self) -> IntegrationStats {
        self.stats
    }

    /// Times of the accepted step boundaries, including both ends of the span.
    pub fn step_times(&self) -> Vec<f64> {
        let mut times = Vec::with_capacity(self.segments.len() + 1);
        times.push(self.t_start);
        times.extend(self.segments.iter().map(|seg| seg.t1));
        times
    }

    /// Writes the interpolated state at `t` into `out`.
    pub fn sample_into(&self, t: f64, out: &mut [f64]) -> Result<()> {
        ensure_in_domain("t", t, self.t_start, self.t_end)?;
        if out.len() != self.dimension {
            return Err(OscilloError::invalid(
                "out",
                format!(
                    "buffer length mismatch. Expected {}, got {}.",
                    self.dimension,
                    out.len()
                ),
            ));
        }
        let idx = self.segments.partition_point(|seg| seg.t1 < t);
        let segment = &self.segments[idx.min(self.segments.len() - 1)];
        segment.evaluate(t, out);
        Ok(())
    }

    pub fn sample(&self, t: f64) -> Result<Vec<f64>> {
        let mut out = vec![0.0; self.dimension];
        self.sample_into(t, &mut out)?;
        Ok(out)
    }
}

fn failure(t: f64, reason: String) -> OscilloError {
    warn!(t, %reason, "integration failed");
    OscilloError::IntegrationFailure { t, reason }
}

fn rms(values: impl Iterator<Item = f64>, len: usize) -> f64 {
    (values.map(|v| v * v).sum::<f64>() / len as f64).sqrt()
}

fn error_norm(error: &[f64], y: &[f64], y_new: &[f64], settings: &IntegratorSettings) -> f64 {
    let scaled = error.iter().zip(y.iter().zip(y_new)).map(|(e, (a, b))| {
        let scale = settings.atol + settings.rtol * a.abs().max(b.abs());
        e / scale
    });
    rms(scaled, error.len())
}

/// Hairer's starting step heuristic.
fn initial_step<S: DynamicalSystem<f64>>(
    system: &S,
    t0: f64,
    y0: &[f64],
    f0: &[f64],
    span: f64,
    error_order: usize,
    settings: &IntegratorSettings,
) -> f64 {
    let dim = y0.len();
    let scale: Vec<f64> = y0
        .iter()
        .map(|y| settings.atol + y.abs() * settings.rtol)
        .collect();
    let d0 = rms(y0.iter().zip(&scale).map(|(y, s)| y / s), dim);
    let d1 = rms(f0.iter().zip(&scale).map(|(f, s)| f / s), dim);
    let h0 = if d0 < 1e-5 || d1 < 1e-5 {
        1e-6_f64
    } else {
        0.01 * d0 / d1
    }
    .min(span);

    let y1: Vec<f64> = y0.iter().zip(f0).map(|(y, f)| y + h0 * f).collect();
    let mut f1 = vec![0.0; dim];
    system.apply(t0 + h0, &y1, &mut f1);
    let d2 = rms(
        f1.iter().zip(f0).zip(&scale).map(|((a, b), s)| (a - b) / s),
        dim,
    ) / h0;

    let h1 = if d1 <= 1e-15 && d2 <= 1e-15 {
        (1e-6_f64).max(h0 * 1e-3)
    } else {
        (0.01 / d1.max(d2)).powf(1.0 / (error_order as f64 + 1.0))
    };

    (100.0 * h0).min(h1).min(span)
}

/// Integrates `system` from `t_span.0` to `t_span.1` starting at `y0`.
///
/// Fails with [`OscilloError::IntegrationFailure`] when the step budget is
/// exhausted, the step size collapses, or the state stops being finite.
pub fn integrate_dense<S: DynamicalSystem<f64>>(
    system: &S,
    t_span: (f64, f64),
    y0: &[f64],
    settings: &IntegratorSettings,
) -> Result<DenseSolution> {
    settings.validate()?;
    let (t_start, t_end) = t_span;
    ensure_finite("t_start", t_start)?;
    ensure_finite("t_end", t_end)?;
    if t_end <= t_start {
        return Err(OscilloError::invalid(
            "t_span",
            format!("end time {t_end} must exceed start time {t_start}"),
        ));
    }
    let dim = system.dimension();
    if dim == 0 {
        return Err(OscilloError::invalid("system", "has zero dimension"));
    }
    if y0.len() != dim {
        return Err(OscilloError::invalid(
            "y0",
            format!("dimension mismatch. Expected {}, got {}.", dim, y0.len()),
        ));
    }
    if let Some(bad) = y0.iter().find(|v| !v.is_finite()) {
        return Err(OscilloError::invalid(
            "y0",
            format!("must be finite, got {bad}"),
        ));
    }

    let mut stepper = DormandPrince54::<f64>::new(dim);
    let mut stats = IntegrationStats::default();
    let mut t = t_start;
    let mut y = y0.to_vec();
    let mut f = vec![0.0; dim];
    system.apply(t, &y, &mut f);
    stats.evaluations += 1;
    if f.iter().any(|v| !v.is_finite()) {
        return Err(failure(t, "vector field is not finite at the initial state".into()));
    }

    let max_step = settings.max_step.unwrap_or(f64::INFINITY);
    let error_exponent = -1.0 / (stepper.error_order() as f64 + 1.0);
    let mut h = match settings.first_step {
        Some(h) => h,
        None => {
            stats.evaluations += 1;
            initial_step(
                system,
                t,
                &y,
                &f,
                t_end - t_start,
                stepper.error_order(),
                settings,
            )
        }
    }
    .min(max_step);

    let mut segments = Vec::new();
    let mut rejected_last = false;

    while t < t_end {
        if stats.accepted + stats.rejected >= settings.max_steps {
            return Err(failure(
                t,
                format!("maximum number of steps ({}) exceeded", settings.max_steps),
            ));
        }
        let min_step = 10.0 * f64::EPSILON * t.abs().max(t_end.abs()).max(1.0);
        if h.is_nan() || h < min_step {
            return Err(failure(
                t,
                format!("step size {h:e} fell below the minimum {min_step:e}"),
            ));
        }

        let mut dt = h.min(max_step);
        let last = t + dt >= t_end;
        if last {
            dt = t_end - t;
        }

        stepper.attempt(system, t, &y, &f, dt);
        stats.evaluations += 6;

        let err = error_norm(stepper.error_estimate(), &y, stepper.proposal(), settings);
        if !err.is_finite() {
            return Err(failure(t, "error estimate is not finite".into()));
        }

        if err < 1.0 {
            let next = stepper.proposal();
            let next_deriv = stepper.proposal_derivative();
            if next.iter().chain(next_deriv).any(|v| !v.is_finite()) {
                return Err(failure(t, "state is not finite".into()));
            }
            let t_new = if last { t_end } else { t + dt };
            segments.push(HermiteSegment {
                t0: t,
                t1: t_new,
                y0: y.clone(),
                y1: next.to_vec(),
                f0: f.clone(),
                f1: next_deriv.to_vec(),
            });

            let mut factor = if err == 0.0 {
                MAX_FACTOR
            } else {
                (SAFETY * err.powf(error_exponent)).min(MAX_FACTOR)
            };
            if rejected_last {
                factor = factor.min(1.0);
            }
            h = dt * factor;
            t = t_new;
            y.copy_from_slice(next);
            f.copy_from_slice(next_deriv);
            stats.accepted += 1;
            rejected_last = false;
        } else {
            let factor = (SAFETY * err.powf(error_exponent)).max(MIN_FACTOR);
            trace!(t, dt, err, "step rejected");
            h = dt * factor;
            stats.rejected += 1;
            rejected_last = true;
        }
    }

    debug!(
        accepted = stats.accepted,
        rejected = stats.rejected,
        evaluations = stats.evaluations,
        t_end,
        "dense integration finished"
    );

    Ok(DenseSolution {
        dimension: dim,
        t_start,
        t_end,
        segments,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::{integrate_dense, IntegratorSettings};
    use crate::error::OscilloError;
    use crate::traits::DynamicalSystem;

    struct Oscillator;

    impl DynamicalSystem<f64> for Oscillator {
        fn dimension(&self) -> usize {
            2
        }

        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = x[1];
            out[1] = -x[0];
        }
    }

    struct Blowup;

    impl DynamicalSystem<f64> for Blowup {
        fn dimension(&self) -> usize {
            1
        }

        // x' = x^2 with x(0) = 1 explodes at t = 1
        fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) {
            out[0] = x[0] * x[0];
        }
    }

    fn assert_err_contains<T: std::fmt::Debug>(result: crate::error::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    #[test]
    fn dense_output_tracks_harmonic_oscillator_between_steps() {
        let tau = 2.0 * std::f64::consts::PI;
        let solution = integrate_dense(
            &Oscillator,
            (0.0, tau),
            &[1.0, 0.0],
            &IntegratorSettings::default(),
        )
        .expect("integration should succeed");

        for i in 0..=40 {
            let t = tau * i as f64 / 40.0;
            let y = solution.sample(t).expect("sample inside span");
            assert!((y[0] - t.cos()).abs() < 1e-5, "x({t}) = {}", y[0]);
            assert!((y[1] + t.sin()).abs() < 1e-5, "v({t}) = {}", y[1]);
        }
        assert!(solution.stats().accepted > 1);
    }

    #[test]
    fn sample_at_start_returns_initial_state_exactly() {
        let solution = integrate_dense(
            &Oscillator,
            (0.0, 1.0),
            &[0.3, -0.7],
            &IntegratorSettings::default(),
        )
        .expect("integration should succeed");
        assert_eq!(solution.sample(0.0).expect("start"), vec![0.3, -0.7]);
        let times = solution.step_times();
        assert_eq!(times.first().copied(), Some(0.0));
        assert_eq!(times.last().copied(), Some(1.0));
    }

    #[test]
    fn sampling_outside_span_is_a_domain_error() {
        let solution = integrate_dense(
            &Oscillator,
            (0.0, 1.0),
            &[1.0, 0.0],
            &IntegratorSettings::default(),
        )
        .expect("integration should succeed");
        assert!(matches!(
            solution.sample(1.5),
            Err(OscilloError::OutOfDomain { what: "t", .. })
        ));
        assert!(solution.sample(-1e-3).is_err());
        assert!(solution.sample(f64::NAN).is_err());
        let mut short = [0.0; 1];
        assert_err_contains(solution.sample_into(0.5, &mut short), "buffer length mismatch");
    }

    #[test]
    fn finite_time_blowup_surfaces_integration_failure() {
        let result = integrate_dense(&Blowup, (0.0, 2.0), &[1.0], &IntegratorSettings::default());
        match result {
            Err(OscilloError::IntegrationFailure { t, .. }) => assert!(t <= 1.0 + 1e-6),
            other => panic!("expected integration failure, got {other:?}"),
        }
    }

    #[test]
    fn step_budget_is_enforced() {
        let settings = IntegratorSettings {
            max_steps: 3,
            max_step: Some(0.01),
            ..IntegratorSettings::default()
        };
        assert_err_contains(
            integrate_dense(&Oscillator, (0.0, 1.0), &[1.0, 0.0], &settings),
            "maximum number of steps",
        );
    }

    #[test]
    fn max_step_bounds_every_segment() {
        let settings = IntegratorSettings {
            max_step: Some(0.05),
            ..IntegratorSettings::default()
        };
        let solution = integrate_dense(&Oscillator, (0.0, 1.0), &[1.0, 0.0], &settings)
            .expect("integration should succeed");
        let times = solution.step_times();
        assert!(times.windows(2).all(|w| w[1] - w[0] <= 0.05 + 1e-12));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let settings = IntegratorSettings::default();
        assert_err_contains(
            integrate_dense(&Oscillator, (1.0, 1.0), &[1.0, 0.0], &settings),
            "must exceed start time",
        );
        assert_err_contains(
            integrate_dense(&Oscillator, (0.0, 1.0), &[1.0], &settings),
            "dimension mismatch",
        );
        assert_err_contains(
            integrate_dense(&Oscillator, (0.0, 1.0), &[f64::NAN, 0.0], &settings),
            "must be finite",
        );
        let bad = IntegratorSettings {
            rtol: 0.0,
            ..IntegratorSettings::default()
        };
        assert_err_contains(
            integrate_dense(&Oscillator, (0.0, 1.0), &[1.0, 0.0], &bad),
            "rtol",
        );
    }

    #[test]
    fn settings_round_trip_through_json_with_defaults() {
        let parsed: IntegratorSettings =
            serde_json::from_str(r#"{"rtol":1e-6,"atol":1e-9,"max_steps":500}"#)
                .expect("settings should parse");
        assert_eq!(parsed.max_step, None);
        assert_eq!(parsed.first_step, None);
        assert_eq!(parsed.max_steps, 500);
    }
}
