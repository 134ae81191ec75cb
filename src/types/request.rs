//! Inbound request validation.

use crate::features::{FeatureVector, ValidationError};
use serde::Deserialize;
use serde_json::Value;

/// Wire shape of a prediction request body.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionRequest {
    /// Feature values for D0..D7, in order.
    pub data: Vec<f64>,
}

/// Validate a request payload into a [`FeatureVector`].
///
/// Validation is layered the way the contract demands: first the schema
/// (a `data` field holding a non-empty numeric array), then the explicit
/// feature-count check. The two failure kinds stay distinct.
pub fn parse_request(payload: &Value) -> Result<FeatureVector, ValidationError> {
    let request: PredictionRequest = serde_json::from_value(payload.clone())
        .map_err(|e| ValidationError::Schema(e.to_string()))?;

    if request.data.is_empty() {
        return Err(ValidationError::Schema(
            "`data` must contain at least one value".to_string(),
        ));
    }

    FeatureVector::try_from(request.data)
}
