//! Feature vector definitions for CAN bus telemetry.
//!
//! Every record is a fixed-width vector of 8 numeric values positionally
//! bound to the named slots D0..D7. Slot identity matters: the batch
//! imputation rule applies to D5, D6 and D7 only.

/// Number of features per record.
pub const FEATURE_COUNT: usize = 8;

/// Feature column names in the order expected by the scaler and the models.
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] =
    ["D0", "D1", "D2", "D3", "D4", "D5", "D6", "D7"];

/// Columns whose missing cells are median-filled on the batch path.
pub const IMPUTED_COLUMNS: [&str; 3] = ["D5", "D6", "D7"];

/// Slot index of a named feature column.
pub fn slot_of(column: &str) -> Option<usize> {
    FEATURE_COLUMNS.iter().position(|c| *c == column)
}

/// A validated input vector of exactly [`FEATURE_COUNT`] values.
///
/// Construction goes through [`TryFrom<Vec<f64>>`] so a vector of any other
/// length is rejected up front rather than truncated or padded.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The original input values, echoed back verbatim in responses.
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.to_vec()
    }
}

impl TryFrom<Vec<f64>> for FeatureVector {
    type Error = ValidationError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let actual = values.len();
        let values: [f64; FEATURE_COUNT] = values
            .try_into()
            .map_err(|_| ValidationError::FeatureCount {
                expected: FEATURE_COUNT,
                actual,
            })?;
        Ok(Self(values))
    }
}

/// Input validation failure, tagged by kind.
///
/// Both kinds are client errors; the distinction is preserved so callers can
/// tell a malformed payload from a correctly shaped one of the wrong width.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Malformed payload: missing `data` field, wrong element type, or an
    /// empty sequence.
    #[error("Invalid request payload: {0}")]
    Schema(String),

    /// Correct shape but the wrong number of features.
    #[error("Input data must contain exactly 8 features corresponding to D0 to D7.")]
    FeatureCount { expected: usize, actual: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_order() {
        assert_eq!(FEATURE_COLUMNS.len(), FEATURE_COUNT);
        assert_eq!(slot_of("D0"), Some(0));
        assert_eq!(slot_of("D5"), Some(5));
        assert_eq!(slot_of("D7"), Some(7));
        assert_eq!(slot_of("D8"), None);
    }

    #[test]
    fn test_try_from_exact_width() {
        let input = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let vector = FeatureVector::try_from(input.clone()).unwrap();
        assert_eq!(vector.to_vec(), input);
    }

    #[test]
    fn test_try_from_rejects_short_input() {
        let err = FeatureVector::try_from(vec![1.0, 2.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::FeatureCount {
                expected: FEATURE_COUNT,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_try_from_rejects_long_input() {
        let err = FeatureVector::try_from(vec![0.0; 9]).unwrap_err();
        assert!(matches!(err, ValidationError::FeatureCount { actual: 9, .. }));
    }
}
