//! CAN Prediction Service Library
//!
//! A thin serving layer around pre-trained CAN bus traffic classifiers:
//! validate an 8-feature input vector, apply the fitted scaler, run ONNX
//! inference, and shape the result into a response envelope. The same
//! contract is exposed over HTTP and as a batch CSV tool.

pub mod batch;
pub mod config;
pub mod features;
pub mod metrics;
pub mod models;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use features::FeatureVector;
pub use models::inference::InferenceEngine;
pub use server::AppState;
