use std::ops::RangeInclusive;

/// Input rejected before any network call is made.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{field} must be at least {min} (got {value})")]
    BelowMinimum {
        field: &'static str,
        value: f64,
        min: f64,
    },
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::OutOfRange { field, .. } | ValidationError::BelowMinimum { field, .. } => {
                field
            }
        }
    }
}

/// NaN and infinities never satisfy a range.
pub(crate) fn within(
    field: &'static str,
    value: f64,
    range: RangeInclusive<f64>,
) -> Result<(), ValidationError> {
    if value.is_finite() && range.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

pub(crate) fn at_least(field: &'static str, value: f64, min: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= min {
        Ok(())
    } else {
        Err(ValidationError::BelowMinimum { field, value, min })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_bounds_are_inclusive() {
        assert!(within("loan_amnt", 500.0, 500.0..=50_000.0).is_ok());
        assert!(within("loan_amnt", 50_000.0, 500.0..=50_000.0).is_ok());
        let err = within("loan_amnt", 499.99, 500.0..=50_000.0).expect_err("below range");
        assert_eq!(err.field(), "loan_amnt");
        assert!(err.to_string().contains("between 500 and 50000"));
    }

    #[test]
    fn non_finite_values_are_rejected() {
        assert!(within("dti", f64::NAN, 0.0..=100.0).is_err());
        assert!(at_least("annual_inc", f64::INFINITY, 0.0).is_err());
        assert!(at_least("annual_inc", 0.0, 0.0).is_ok());
    }
}
