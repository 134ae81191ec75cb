//! Fitted classifier capability and its ONNX-backed implementation.
//!
//! A classifier maps a scaled feature row to a discrete label and, when the
//! artifact exposes one, a probability distribution over its classes.
//! Exported scikit-learn-style models emit an int64 label tensor plus either
//! a `[batch, n_classes]` float tensor or a `seq(map(int64, float))`; both
//! probability layouts are handled, in the artifact's own class ordering.

use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{Session, SessionOutputs};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType};
use std::sync::RwLock;
use tracing::debug;

/// Result of running one classifier over one input row.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Discrete class label.
    pub label: i64,
    /// Probability per class, in the artifact's class ordering. Empty when
    /// the artifact has no probability output.
    pub probabilities: Vec<f64>,
}

/// A fitted classifier artifact, opaque to the serving layer.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Predict one already-scaled feature row.
    fn predict(&self, features: &[f32]) -> Result<Prediction>;
}

/// Classifier backed by an ONNX Runtime session.
pub struct OnnxClassifier {
    /// Model name, used in logs and error messages.
    name: String,
    /// ONNX Runtime session (wrapped for interior mutability).
    session: RwLock<Session>,
    /// Input name for the model.
    input_name: String,
    /// Output name for probabilities.
    output_name: String,
}

impl OnnxClassifier {
    pub fn new(name: String, session: Session, input_name: String, output_name: String) -> Self {
        Self {
            name,
            session: RwLock::new(session),
            input_name,
            output_name,
        }
    }

    /// Extract the discrete label from the model outputs.
    ///
    /// Exporters emit the label as an int64 (sometimes int32) tensor whose
    /// name contains "label".
    fn extract_label(&self, outputs: &SessionOutputs) -> Option<i64> {
        for (name, output) in outputs.iter() {
            if !name.contains("label") {
                continue;
            }
            if let Ok((_, data)) = output.try_extract_tensor::<i64>() {
                return data.first().copied();
            }
            if let Ok((_, data)) = output.try_extract_tensor::<i32>() {
                return data.first().map(|&v| v as i64);
            }
        }
        None
    }

    /// Extract the per-class probability vector from the model outputs.
    ///
    /// Returns an empty vector when the artifact exposes no probability
    /// output; that is a supported artifact shape, not an error.
    fn extract_probabilities(&self, outputs: &SessionOutputs) -> Result<Vec<f64>> {
        // Preferred output first, then fall back to scanning everything
        // except the label.
        if let Some(output) = outputs.get(&self.output_name) {
            if !self.output_name.contains("label") {
                if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                    let (shape, data) = tensor;
                    return Ok(probabilities_from_tensor(&shape, data));
                }
                if DynSequenceValueType::can_downcast(&output.dtype()) {
                    if let Ok(probs) = probabilities_from_sequence_map(output) {
                        return Ok(probs);
                    }
                }
            }
        }

        for (name, output) in outputs.iter() {
            if name.contains("label") {
                continue;
            }
            if let Ok(tensor) = output.try_extract_tensor::<f32>() {
                let (shape, data) = tensor;
                debug!(model = %self.name, output = %name, "Extracted probabilities from tensor");
                return Ok(probabilities_from_tensor(&shape, data));
            }
            if DynSequenceValueType::can_downcast(&output.dtype()) {
                if let Ok(probs) = probabilities_from_sequence_map(&output) {
                    debug!(model = %self.name, output = %name, "Extracted probabilities from seq(map)");
                    return Ok(probs);
                }
            }
        }

        Ok(Vec::new())
    }
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict(&self, features: &[f32]) -> Result<Prediction> {
        use ort::value::Tensor;

        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;

        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        let label = self.extract_label(&outputs);
        let probabilities = self.extract_probabilities(&outputs)?;

        // Some artifacts expose only probabilities; derive the label then.
        let label = match label {
            Some(label) => label,
            None => probabilities
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| a.total_cmp(b))
                .map(|(i, _)| i as i64)
                .ok_or_else(|| {
                    anyhow::anyhow!("Model {} produced neither label nor probabilities", self.name)
                })?,
        };

        Ok(Prediction {
            label,
            probabilities,
        })
    }
}

/// Pull the first row out of a `[batch, n_classes]` or `[n_classes]` tensor.
fn probabilities_from_tensor(shape: &ort::tensor::Shape, data: &[f32]) -> Vec<f64> {
    let dims: Vec<i64> = shape.iter().copied().collect();

    let num_classes = match dims.len() {
        2 => dims[1] as usize,
        1 => dims[0] as usize,
        _ => data.len(),
    };

    data.iter()
        .take(num_classes)
        .map(|&p| p as f64)
        .collect()
}

/// Pull the class probabilities out of a `seq(map(int64, float))` output,
/// preserving the map's own ordering.
fn probabilities_from_sequence_map(output: &ort::value::DynValue) -> Result<Vec<f64>> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;

    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;

    // Batch size is always 1 on this path.
    let map_value = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence output"))?;

    let kv_pairs = map_value.try_extract_key_values::<i64, f32>()?;
    if kv_pairs.is_empty() {
        anyhow::bail!("Empty probability map");
    }

    Ok(kv_pairs.iter().map(|&(_, prob)| prob as f64).collect())
}
