//! Artifact loader.
//!
//! All artifacts are loaded once at startup. A missing or unreadable file is
//! fatal: the service refuses to start rather than serve with a partial
//! artifact set.

use crate::models::classifier::OnnxClassifier;
use crate::models::inference::ModelBundle;
use crate::models::scaler::StandardScaler;
use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loader for scaler and classifier artifacts.
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ArtifactLoader {
    /// Create a new artifact loader with default settings (1 thread)
    pub fn new() -> Result<Self> {
        Self::with_threads(1)
    }

    /// Create a new artifact loader with specified number of threads
    pub fn with_threads(onnx_threads: usize) -> Result<Self> {
        ort::init().commit()?;
        info!(onnx_threads = onnx_threads, "ONNX Runtime initialized");
        Ok(Self { onnx_threads })
    }

    /// Load a single ONNX classifier from file
    pub fn load_classifier<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<OnnxClassifier> {
        let path = path.as_ref();

        if !path.exists() {
            anyhow::bail!("Model file not found: {}", path.display());
        }

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        // Get input/output names
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .last()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "probabilities".to_string())
            });

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(OnnxClassifier::new(
            name.to_string(),
            session,
            input_name,
            output_name,
        ))
    }

    /// Load fitted scaler parameters from file
    pub fn load_scaler<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<StandardScaler> {
        let path = path.as_ref();

        if !path.exists() {
            anyhow::bail!("Scaler file not found: {}", path.display());
        }

        let scaler = StandardScaler::from_file(path)?;

        info!(
            model = %name,
            path = %path.display(),
            width = scaler.width(),
            "Scaler parameters loaded"
        );

        Ok(scaler)
    }

    /// Load one scaler/classifier pair as a named bundle.
    pub fn load_bundle<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        name: &str,
        classifier_path: P,
        scaler_path: Q,
    ) -> Result<ModelBundle> {
        let scaler = self.load_scaler(scaler_path, name)?;
        let classifier = self.load_classifier(classifier_path, name)?;
        Ok(ModelBundle::new(name, scaler, Box::new(classifier)))
    }
}
