//! Inference engine for the prediction service.
//!
//! A [`ModelBundle`] ties one fitted scaler to one fitted classifier; the
//! engine holds one bundle (single variant) or two independent bundles
//! (dual variant, "flag" and "source"). Bundles are read-only after load and
//! shared across requests.

use crate::config::{AppConfig, ServiceVariant};
use crate::features::FeatureVector;
use crate::models::classifier::{Classifier, Prediction};
use crate::models::loader::ArtifactLoader;
use crate::models::scaler::StandardScaler;
use anyhow::{Context, Result};
use tracing::debug;

/// One scaler/classifier pair loaded from disk.
pub struct ModelBundle {
    name: String,
    scaler: StandardScaler,
    classifier: Box<dyn Classifier>,
}

impl ModelBundle {
    pub fn new(name: impl Into<String>, scaler: StandardScaler, classifier: Box<dyn Classifier>) -> Self {
        Self {
            name: name.into(),
            scaler,
            classifier,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scale one row and run the classifier over it.
    fn run(&self, row: &[f64]) -> Result<Prediction> {
        let scaled = self.scaler.transform(row)?;
        let scaled: Vec<f32> = scaled.iter().map(|&v| v as f32).collect();
        let prediction = self.classifier.predict(&scaled)?;

        debug!(
            model = %self.name,
            label = prediction.label,
            classes = prediction.probabilities.len(),
            "Inference complete"
        );

        Ok(prediction)
    }

    /// Predict one validated input vector.
    pub fn predict(&self, input: &FeatureVector) -> Result<Prediction> {
        self.run(input.as_slice())
    }

    /// Predict one raw (already imputed) batch row, returning the label only.
    pub fn predict_row(&self, row: &[f64]) -> Result<i64> {
        Ok(self.run(row)?.label)
    }
}

/// Result of running the engine over one input.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    Single(Prediction),
    Dual {
        flag: Prediction,
        source: Prediction,
    },
}

/// The loaded inference pipelines, one per deployment variant.
pub enum InferenceEngine {
    Single(ModelBundle),
    Dual {
        flag: ModelBundle,
        source: ModelBundle,
    },
}

impl InferenceEngine {
    /// Load every artifact named by the configuration. Fails fast: any
    /// missing file aborts startup.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let loader = ArtifactLoader::with_threads(config.models.onnx_threads)?;

        match config.models.variant {
            ServiceVariant::Single => {
                let paths = config
                    .models
                    .single
                    .as_ref()
                    .context("Configuration is missing the [models.single] section")?;
                let bundle = loader.load_bundle("classifier", &paths.classifier, &paths.scaler)?;
                Ok(Self::Single(bundle))
            }
            ServiceVariant::Dual => {
                let paths = config
                    .models
                    .dual
                    .as_ref()
                    .context("Configuration is missing the [models.dual] section")?;
                let flag = loader.load_bundle("flag", &paths.flag.classifier, &paths.flag.scaler)?;
                let source =
                    loader.load_bundle("source", &paths.source.classifier, &paths.source.scaler)?;
                Ok(Self::Dual { flag, source })
            }
        }
    }

    pub fn variant(&self) -> ServiceVariant {
        match self {
            Self::Single(_) => ServiceVariant::Single,
            Self::Dual { .. } => ServiceVariant::Dual,
        }
    }

    /// Get loaded model names
    pub fn model_names(&self) -> Vec<&str> {
        match self {
            Self::Single(bundle) => vec![bundle.name()],
            Self::Dual { flag, source } => vec![flag.name(), source.name()],
        }
    }

    /// Run inference over one validated input vector.
    ///
    /// The dual variant runs its two pipelines over the same input with no
    /// shared state; neither result depends on the other.
    pub fn predict(&self, input: &FeatureVector) -> Result<EngineOutput> {
        match self {
            Self::Single(bundle) => Ok(EngineOutput::Single(bundle.predict(input)?)),
            Self::Dual { flag, source } => Ok(EngineOutput::Dual {
                flag: flag.predict(input)?,
                source: source.predict(input)?,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedClassifier {
        name: String,
        prediction: Prediction,
    }

    impl FixedClassifier {
        fn boxed(name: &str, label: i64, probabilities: Vec<f64>) -> Box<dyn Classifier> {
            Box::new(Self {
                name: name.to_string(),
                prediction: Prediction {
                    label,
                    probabilities,
                },
            })
        }
    }

    impl Classifier for FixedClassifier {
        fn name(&self) -> &str {
            &self.name
        }

        fn predict(&self, _features: &[f32]) -> Result<Prediction> {
            Ok(self.prediction.clone())
        }
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(vec![0.0; 8], vec![1.0; 8])
    }

    fn input() -> FeatureVector {
        FeatureVector::new([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
    }

    #[test]
    fn test_single_predict() {
        let engine = InferenceEngine::Single(ModelBundle::new(
            "classifier",
            identity_scaler(),
            FixedClassifier::boxed("classifier", 1, vec![0.2, 0.8]),
        ));

        let output = engine.predict(&input()).unwrap();
        match output {
            EngineOutput::Single(prediction) => {
                assert_eq!(prediction.label, 1);
                assert_eq!(prediction.probabilities, vec![0.2, 0.8]);
            }
            EngineOutput::Dual { .. } => panic!("expected single output"),
        }
    }

    #[test]
    fn test_scaler_width_mismatch_is_an_error() {
        let bundle = ModelBundle::new(
            "classifier",
            StandardScaler::new(vec![0.0; 4], vec![1.0; 4]),
            FixedClassifier::boxed("classifier", 0, vec![]),
        );

        assert!(bundle.predict(&input()).is_err());
    }

    #[test]
    fn test_dual_predictions_are_independent() {
        let source = || FixedClassifier::boxed("source", 2, vec![0.1, 0.2, 0.7]);

        let engine = InferenceEngine::Dual {
            flag: ModelBundle::new(
                "flag",
                identity_scaler(),
                FixedClassifier::boxed("flag", 0, vec![0.9, 0.1]),
            ),
            source: ModelBundle::new("source", identity_scaler(), source()),
        };
        let first = engine.predict(&input()).unwrap();

        // Swap the flag model; the source result must not change.
        let engine = InferenceEngine::Dual {
            flag: ModelBundle::new(
                "flag",
                identity_scaler(),
                FixedClassifier::boxed("flag", 1, vec![0.3, 0.7]),
            ),
            source: ModelBundle::new("source", identity_scaler(), source()),
        };
        let second = engine.predict(&input()).unwrap();

        let source_of = |output: EngineOutput| match output {
            EngineOutput::Dual { source, .. } => source,
            EngineOutput::Single(_) => panic!("expected dual output"),
        };
        assert_eq!(source_of(first), source_of(second));
    }

    #[test]
    fn test_model_names() {
        let engine = InferenceEngine::Dual {
            flag: ModelBundle::new(
                "flag",
                identity_scaler(),
                FixedClassifier::boxed("flag", 0, vec![]),
            ),
            source: ModelBundle::new(
                "source",
                identity_scaler(),
                FixedClassifier::boxed("source", 0, vec![]),
            ),
        };

        assert_eq!(engine.model_names(), vec!["flag", "source"]);
        assert_eq!(engine.variant(), ServiceVariant::Dual);
    }
}
