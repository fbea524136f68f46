//! Error types shared by every numeric engine in the crate.

use thiserror::Error;

/// Errors produced while building or querying a numeric engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OscilloError {
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Integration failed at t = {t}: {reason}")]
    IntegrationFailure { t: f64, reason: String },

    #[error("Quadrature failed: {reason}")]
    QuadratureFailure { reason: String },

    #[error("{what} = {value} is outside the valid domain [{min}, {max}]")]
    OutOfDomain {
        what: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Unknown chord `{name}`")]
    UnknownChord { name: String },
}

pub type Result<T> = std::result::Result<T, OscilloError>;

impl OscilloError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        OscilloError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Rejects non-finite or non-positive values.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(OscilloError::invalid(name, format!("must be finite, got {value}")));
    }
    if value <= 0.0 {
        return Err(OscilloError::invalid(name, format!("must be positive, got {value}")));
    }
    Ok(())
}

/// Rejects non-finite or negative values.
pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(OscilloError::invalid(name, format!("must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(OscilloError::invalid(
            name,
            format!("must be non-negative, got {value}"),
        ));
    }
    Ok(())
}

pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(OscilloError::invalid(name, format!("must be finite, got {value}")))
    }
}

/// Checks `value ∈ [min, max]`; NaN is always out of domain.
pub(crate) fn ensure_in_domain(what: &'static str, value: f64, min: f64, max: f64) -> Result<()> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(OscilloError::OutOfDomain {
            what,
            value,
            min,
            max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_check_rejects_zero_nan_and_infinity() {
        assert!(ensure_positive("L", 1.0).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ensure_positive("L", bad).expect_err("value should be rejected");
            assert!(matches!(err, OscilloError::InvalidParameter { name: "L", .. }));
        }
    }

    #[test]
    fn non_negative_check_accepts_zero() {
        assert!(ensure_non_negative("gamma", 0.0).is_ok());
        assert!(ensure_non_negative("gamma", -1e-12).is_err());
    }

    #[test]
    fn domain_check_is_inclusive_and_rejects_nan() {
        assert!(ensure_in_domain("t", 0.0, 0.0, 1.0).is_ok());
        assert!(ensure_in_domain("t", 1.0, 0.0, 1.0).is_ok());
        assert!(ensure_in_domain("t", 1.0 + 1e-9, 0.0, 1.0).is_err());
        assert!(ensure_in_domain("t", f64::NAN, 0.0, 1.0).is_err());
    }

    #[test]
    fn messages_name_the_offending_value() {
        let err = OscilloError::OutOfDomain {
            what: "t",
            value: 12.0,
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(err.to_string(), "t = 12 is outside the valid domain [0, 10]");
        let err = OscilloError::UnknownChord {
            name: "Z".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown chord `Z`");
    }
}
