//! HTTP serving layer.
//!
//! One route does the work: `POST /predict`. Validation failures map to 400
//! with a tagged error envelope; anything that goes wrong past validation
//! maps to 500. `GET /` serves the static client page and `GET /health` the
//! operational summary.

use crate::metrics::ServiceMetrics;
use crate::models::inference::InferenceEngine;
use crate::types::request::parse_request;
use crate::types::response::{ErrorResponse, PredictResponse};
use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeFile;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, warn};
use uuid::Uuid;

/// Immutable service context shared by every request handler.
///
/// Built once at startup; the engine is never mutated afterwards.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<InferenceEngine>,
    pub metrics: Arc<ServiceMetrics>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: InferenceEngine) -> Self {
        Self {
            engine: Arc::new(engine),
            metrics: Arc::new(ServiceMetrics::new()),
            started_at: Utc::now(),
        }
    }
}

pub async fn start_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_app(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid server address")?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route_service("/", ServeFile::new("static/client.html"))
        .route("/predict", post(predict))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "variant": format!("{:?}", state.engine.variant()).to_lowercase(),
        "started_at": state.started_at.to_rfc3339(),
    }))
}

/// Handle a prediction request.
///
/// Validation happens before any numeric work: a malformed body or a wrong
/// feature count never reaches the scaler.
async fn predict(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let Json(payload) = match body {
        Ok(json) => json,
        Err(rejection) => {
            state.metrics.record_error();
            warn!(%request_id, error = %rejection.body_text(), "Rejected malformed request body");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let input = match parse_request(&payload) {
        Ok(input) => input,
        Err(e) => {
            state.metrics.record_error();
            warn!(%request_id, error = %e, "Request failed validation");
            return error_response(StatusCode::BAD_REQUEST, e.to_string());
        }
    };

    match state.engine.predict(&input) {
        Ok(output) => {
            let elapsed = start.elapsed();
            state.metrics.record_request(elapsed);
            debug!(
                %request_id,
                elapsed_us = elapsed.as_micros() as u64,
                "Prediction served"
            );
            (
                StatusCode::OK,
                Json(PredictResponse::from_output(output, &input)),
            )
                .into_response()
        }
        Err(e) => {
            state.metrics.record_error();
            error!(%request_id, error = %e, "Inference failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Prediction error: {}", e),
            )
        }
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(ErrorResponse::new(message))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classifier::{Classifier, Prediction};
    use crate::models::inference::ModelBundle;
    use crate::models::scaler::StandardScaler;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    /// Stub classifier that also counts how often it is called.
    struct CountingClassifier {
        name: String,
        prediction: Prediction,
        calls: Arc<AtomicUsize>,
    }

    impl Classifier for CountingClassifier {
        fn name(&self) -> &str {
            &self.name
        }

        fn predict(&self, _features: &[f32]) -> anyhow::Result<Prediction> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.prediction.clone())
        }
    }

    struct FailingClassifier;

    impl Classifier for FailingClassifier {
        fn name(&self) -> &str {
            "failing"
        }

        fn predict(&self, _features: &[f32]) -> anyhow::Result<Prediction> {
            anyhow::bail!("tensor shape mismatch")
        }
    }

    fn identity_scaler() -> StandardScaler {
        StandardScaler::new(vec![0.0; 8], vec![1.0; 8])
    }

    fn counting_bundle(
        name: &str,
        label: i64,
        probabilities: Vec<f64>,
    ) -> (ModelBundle, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let bundle = ModelBundle::new(
            name,
            identity_scaler(),
            Box::new(CountingClassifier {
                name: name.to_string(),
                prediction: Prediction {
                    label,
                    probabilities,
                },
                calls: calls.clone(),
            }),
        );
        (bundle, calls)
    }

    fn single_app() -> (Router, Arc<AtomicUsize>) {
        let (bundle, calls) = counting_bundle("classifier", 1, vec![0.25, 0.75]);
        let app = create_app(AppState::new(InferenceEngine::Single(bundle)));
        (app, calls)
    }

    async fn post_predict(app: Router, body: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/predict")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_predict_success_echoes_input() {
        let (app, _) = single_app();
        let body = json!({ "data": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0] }).to_string();

        let (status, value) = post_predict(app, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["status"], "success");
        assert_eq!(value["prediction"]["predicted_class"], 1);
        assert_eq!(
            value["prediction"]["input_data"],
            json!([1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0])
        );
    }

    #[tokio::test]
    async fn test_wrong_length_is_rejected_before_inference() {
        let (app, calls) = single_app();
        let body = json!({ "data": [1.0, 2.0, 3.0] }).to_string();

        let (status, value) = post_predict(app, &body).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["status"], "error");
        assert!(value["error"]
            .as_str()
            .unwrap()
            .contains("exactly 8 features"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_data_field_is_rejected_before_inference() {
        let (app, calls) = single_app();

        let (status, value) = post_predict(app, r#"{"values": [1, 2]}"#).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["status"], "error");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_malformed_json_body() {
        let (app, _) = single_app();

        let (status, value) = post_predict(app, "{not json").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(value["status"], "error");
    }

    #[tokio::test]
    async fn test_inference_failure_maps_to_500() {
        let bundle = ModelBundle::new("classifier", identity_scaler(), Box::new(FailingClassifier));
        let app = create_app(AppState::new(InferenceEngine::Single(bundle)));
        let body = json!({ "data": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0] }).to_string();

        let (status, value) = post_predict(app, &body).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(value["status"], "error");
        assert!(value["error"]
            .as_str()
            .unwrap()
            .starts_with("Prediction error: "));
    }

    #[tokio::test]
    async fn test_dual_variant_response() {
        let (flag, _) = counting_bundle("flag", 0, vec![0.9, 0.1]);
        let (source, _) = counting_bundle("source", 2, vec![0.1, 0.2, 0.7]);
        let app = create_app(AppState::new(InferenceEngine::Dual { flag, source }));
        let body = json!({ "data": [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0] }).to_string();

        let (status, value) = post_predict(app, &body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(value["predictions"]["flag"]["class_labels"], json!(["R", "T"]));
        assert_eq!(
            value["predictions"]["source"]["class_labels"],
            json!(["Source 0", "Source 1", "Source 2"])
        );
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = single_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], "healthy");
        assert_eq!(value["variant"], "single");
    }
}
