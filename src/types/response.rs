//! Response envelopes for the prediction API.
//!
//! Every response carries a `"status"` discriminator. Success envelopes wrap
//! the prediction(s) plus the original input echoed back verbatim; error
//! envelopes carry a human-readable message instead.

use crate::features::FeatureVector;
use crate::models::classifier::Prediction;
use crate::models::inference::EngineOutput;
use serde::Serialize;

/// Class labels of the dual variant's "flag" model.
pub const FLAG_CLASS_LABELS: [&str; 2] = ["R", "T"];

/// One shaped prediction result.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutput {
    pub predicted_class: i64,
    pub probabilities: Vec<f64>,
    /// Present on the dual variant only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_labels: Option<Vec<String>>,
    /// The submitted vector, echoed unchanged (pre-scaling, pre-imputation).
    pub input_data: Vec<f64>,
}

impl PredictionOutput {
    fn shaped(prediction: Prediction, input: &FeatureVector, class_labels: Option<Vec<String>>) -> Self {
        Self {
            predicted_class: prediction.label,
            probabilities: prediction.probabilities,
            class_labels,
            input_data: input.to_vec(),
        }
    }

    /// Single-variant result: no class labels attached.
    pub fn unlabeled(prediction: Prediction, input: &FeatureVector) -> Self {
        Self::shaped(prediction, input, None)
    }

    /// Dual-variant "flag" result with its fixed R/T labels.
    pub fn flag(prediction: Prediction, input: &FeatureVector) -> Self {
        let labels = FLAG_CLASS_LABELS.iter().map(|s| s.to_string()).collect();
        Self::shaped(prediction, input, Some(labels))
    }

    /// Dual-variant "source" result; labels are synthesized over the
    /// probability count.
    pub fn source(prediction: Prediction, input: &FeatureVector) -> Self {
        let labels = (0..prediction.probabilities.len())
            .map(|i| format!("Source {}", i))
            .collect();
        Self::shaped(prediction, input, Some(labels))
    }
}

/// Both dual-variant results under their fixed keys.
#[derive(Debug, Clone, Serialize)]
pub struct DualPredictions {
    pub flag: PredictionOutput,
    pub source: PredictionOutput,
}

/// Success envelope, shaped per deployment variant.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum PredictResponse {
    Single {
        status: &'static str,
        prediction: PredictionOutput,
    },
    Dual {
        status: &'static str,
        predictions: DualPredictions,
    },
}

impl PredictResponse {
    pub fn from_output(output: EngineOutput, input: &FeatureVector) -> Self {
        match output {
            EngineOutput::Single(prediction) => Self::Single {
                status: "success",
                prediction: PredictionOutput::unlabeled(prediction, input),
            },
            EngineOutput::Dual { flag, source } => Self::Dual {
                status: "success",
                predictions: DualPredictions {
                    flag: PredictionOutput::flag(flag, input),
                    source: PredictionOutput::source(source, input),
                },
            },
        }
    }
}

/// Error envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            status: "error",
            error: error.into(),
        }
    }
}
