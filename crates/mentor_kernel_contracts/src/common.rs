#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SchemaVersion(pub u32);

/// Nanoseconds on the process-local monotonic clock. Not wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonotonicTimeNs(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReasonCodeId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum ContractViolation {
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
    InvalidRange {
        field: &'static str,
        min: f64,
        max: f64,
        got: f64,
    },
    NotFinite {
        field: &'static str,
    },
}

pub trait Validate {
    fn validate(&self) -> Result<(), ContractViolation>;
}

/// Opaque identifier tokens: non-empty, bounded, free of whitespace and
/// control characters.
pub fn validate_token(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ContractViolation> {
    if value.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be non-empty",
        });
    }
    if value.len() > max_len {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds maximum token length",
        });
    }
    if value
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must not contain whitespace or control characters",
        });
    }
    Ok(())
}

/// Human-readable text: non-empty after trimming, bounded.
pub fn validate_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<(), ContractViolation> {
    if value.trim().is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must be non-empty",
        });
    }
    if value.len() > max_len {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "exceeds maximum text length",
        });
    }
    Ok(())
}

/// Scalar required to lie in the closed unit interval.
pub fn validate_unit_fraction(field: &'static str, value: f64) -> Result<(), ContractViolation> {
    if !value.is_finite() {
        return Err(ContractViolation::NotFinite { field });
    }
    if !(0.0..=1.0).contains(&value) {
        return Err(ContractViolation::InvalidRange {
            field,
            min: 0.0,
            max: 1.0,
            got: value,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_common_01_token_rejects_empty_and_whitespace() {
        assert!(validate_token("t", "learner_1", 96).is_ok());
        assert!(validate_token("t", "", 96).is_err());
        assert!(validate_token("t", "two words", 96).is_err());
        assert!(validate_token("t", "tab\there", 96).is_err());
    }

    #[test]
    fn at_common_02_token_enforces_length_bound() {
        let long = "x".repeat(97);
        assert!(validate_token("t", &long, 96).is_err());
        let max = "x".repeat(96);
        assert!(validate_token("t", &max, 96).is_ok());
    }

    #[test]
    fn at_common_03_unit_fraction_bounds() {
        assert!(validate_unit_fraction("f", 0.0).is_ok());
        assert!(validate_unit_fraction("f", 1.0).is_ok());
        assert!(validate_unit_fraction("f", -0.001).is_err());
        assert!(validate_unit_fraction("f", 1.001).is_err());
        assert!(validate_unit_fraction("f", f64::NAN).is_err());
    }
}
