//! CAN Prediction Service - Main Entry Point
//!
//! Loads the fitted scaler and classifier artifacts once at startup and
//! serves predictions over HTTP.

use anyhow::Result;
use can_prediction_service::{
    config::AppConfig, metrics::MetricsReporter, models::inference::InferenceEngine,
    server::{self, AppState},
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("can_prediction_service=info".parse()?),
        )
        .init();

    info!("Starting CAN Prediction Service");

    // Load configuration
    let config = AppConfig::load()?;
    info!(variant = ?config.models.variant, "Configuration loaded successfully");

    // Load artifacts; a missing model or scaler file aborts startup
    let engine = InferenceEngine::from_config(&config)?;
    info!(
        "Inference engine initialized with models: {:?}",
        engine.model_names()
    );

    let state = AppState::new(engine);

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics = state.metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics, 30);
        reporter.start().await;
    });

    server::start_server(state, &config.server.host, config.server.port).await
}
