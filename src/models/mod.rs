//! Model artifacts and inference.
//!
//! Two kinds of opaque fitted artifacts are loaded at startup and never
//! mutated afterwards: scaler parameters (JSON sidecar) and classifiers
//! (ONNX sessions).

pub mod classifier;
pub mod inference;
pub mod loader;
pub mod scaler;
