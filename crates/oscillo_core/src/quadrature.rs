//! Globally adaptive Gauss-Kronrod quadrature on a finite interval.

use crate::error::{ensure_finite, ensure_positive, OscilloError, Result};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Kronrod abscissae on [-1, 1], descending, centre last.
const XGK: [f64; 8] = [
    0.9914553711208126,
    0.9491079123427585,
    0.8648644233597691,
    0.7415311855993945,
    0.5860872354676911,
    0.4058451513773972,
    0.20778495500789848,
    0.0,
];

/// 15-point Kronrod weights matching `XGK`.
const WGK: [f64; 8] = [
    0.022935322010529224,
    0.06309209262997856,
    0.10479001032225019,
    0.14065325971552592,
    0.1690047266392679,
    0.19035057806478542,
    0.20443294007529889,
    0.20948214108472782,
];

/// 7-point Gauss weights for the odd-indexed Kronrod nodes (1, 3, 5, centre).
const WG: [f64; 4] = [
    0.1294849661688697,
    0.27970539148927664,
    0.3818300505051189,
    0.4179591836734694,
];

/// Settings for [`integrate`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QuadratureSettings {
    pub abs_tol: f64,
    pub rel_tol: f64,
    pub max_subintervals: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            abs_tol: 1.49e-8,
            rel_tol: 1.49e-8,
            max_subintervals: 200,
        }
    }
}

impl QuadratureSettings {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("abs_tol", self.abs_tol)?;
        ensure_positive("rel_tol", self.rel_tol)?;
        if self.max_subintervals == 0 {
            return Err(OscilloError::invalid(
                "max_subintervals",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Value and error estimate of a converged quadrature.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadratureResult {
    pub value: f64,
    pub error: f64,
    pub subintervals: usize,
}

#[derive(Debug, Clone, Copy)]
struct Interval {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

fn gauss_kronrod_15<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> Result<Interval> {
    let centre = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(centre);
    let mut kronrod = WGK[7] * fc;
    let mut gauss = WG[3] * fc;
    let mut finite = fc.is_finite();

    for j in 0..7 {
        let dx = half * XGK[j];
        let pair = f(centre - dx) + f(centre + dx);
        finite &= pair.is_finite();
        kronrod += WGK[j] * pair;
        if j % 2 == 1 {
            gauss += WG[j / 2] * pair;
        }
    }

    if !finite {
        return Err(OscilloError::QuadratureFailure {
            reason: format!("integrand is not finite on [{a}, {b}]"),
        });
    }

    Ok(Interval {
        a,
        b,
        value: kronrod * half,
        error: ((kronrod - gauss) * half).abs(),
    })
}

/// Integrates `f` over `[a, b]` by repeatedly bisecting the subinterval with
/// the largest error estimate.
///
/// Fails with [`OscilloError::QuadratureFailure`] if the tolerance is not met
/// within `max_subintervals` or if `f` returns a non-finite value.
pub fn integrate<F: Fn(f64) -> f64>(
    f: F,
    a: f64,
    b: f64,
    settings: &QuadratureSettings,
) -> Result<QuadratureResult> {
    settings.validate()?;
    ensure_finite("a", a)?;
    ensure_finite("b", b)?;
    if a == b {
        return Ok(QuadratureResult {
            value: 0.0,
            error: 0.0,
            subintervals: 0,
        });
    }

    let mut intervals = vec![gauss_kronrod_15(&f, a, b)?];

    loop {
        let value: f64 = intervals.iter().map(|iv| iv.value).sum();
        let error: f64 = intervals.iter().map(|iv| iv.error).sum();
        let tolerance = settings.abs_tol.max(settings.rel_tol * value.abs());
        if error <= tolerance {
            return Ok(QuadratureResult {
                value,
                error,
                subintervals: intervals.len(),
            });
        }
        if intervals.len() >= settings.max_subintervals {
            warn!(error, tolerance, "quadrature subdivision limit reached");
            return Err(OscilloError::QuadratureFailure {
                reason: format!(
                    "error estimate {error:e} exceeds tolerance {tolerance:e} after {} subintervals",
                    intervals.len()
                ),
            });
        }

        let worst = intervals
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map(|(idx, _)| idx)
            .unwrap_or(0);
        let split = intervals.swap_remove(worst);
        let mid = 0.5 * (split.a + split.b);
        trace!(a = split.a, b = split.b, error = split.error, "bisecting");
        intervals.push(gauss_kronrod_15(&f, split.a, mid)?);
        intervals.push(gauss_kronrod_15(&f, mid, split.b)?);
    }
}
