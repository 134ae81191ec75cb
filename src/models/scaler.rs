//! Fitted feature scaler.
//!
//! The scaler is trained offline; only its per-column mean and scale are
//! shipped, as a JSON sidecar next to the model file. Applying it is a pure
//! column-wise affine transform.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Standard-scaler parameters fitted at training time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Per-column mean, in D0..D7 order.
    mean: Vec<f64>,
    /// Per-column scale (standard deviation), in D0..D7 order.
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn new(mean: Vec<f64>, scale: Vec<f64>) -> Self {
        Self { mean, scale }
    }

    /// Load fitted parameters from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open scaler file {}", path.display()))?;
        let scaler: Self = serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse scaler file {}", path.display()))?;

        if scaler.mean.is_empty() || scaler.mean.len() != scaler.scale.len() {
            anyhow::bail!(
                "Inconsistent scaler parameters in {}: {} means, {} scales",
                path.display(),
                scaler.mean.len(),
                scaler.scale.len()
            );
        }

        Ok(scaler)
    }

    /// Number of columns the scaler was fitted on.
    pub fn width(&self) -> usize {
        self.mean.len()
    }

    /// Apply the fitted transform to one row.
    ///
    /// A width mismatch between the row and the fitted parameters is an
    /// artifact/input inconsistency, reported as an error rather than
    /// silently truncated.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.width() {
            anyhow::bail!(
                "Feature dimension mismatch: scaler expects {} columns, got {}",
                self.width(),
                row.len()
            );
        }

        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&value, (&mean, &scale))| (value - mean) / scale)
            .collect())
    }
}
