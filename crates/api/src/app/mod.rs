//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: history/model/engine wiring and the use cases handlers call
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::{AppServices, build_services};

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(services: Arc<AppServices>) -> Router {
    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sensorcast_core::HorizonConfig;
    use sensorcast_infra::{FileModelLoader, ForecastEngine, InMemoryHistorySource};
    use tower::ServiceExt;

    fn app_without_model() -> Router {
        let horizon = HorizonConfig::default();
        let engine = ForecastEngine::new(
            Arc::new(InMemoryHistorySource::new()),
            Arc::new(FileModelLoader::new(horizon)),
            "/no/such/model.onnx",
            horizon,
        );
        build_app(Arc::new(AppServices::new(engine)))
    }

    async fn post(app: Router, uri: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let res = app
            .oneshot(
                Request::post(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn health_is_ok() {
        let res = app_without_model()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_model_is_a_model_load_error() {
        let (status, body) = post(app_without_model(), "/forecast", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "model_load_error");
    }

    #[tokio::test]
    async fn malformed_command_is_rejected_before_forecasting() {
        let (status, body) = post(
            app_without_model(),
            "/command",
            serde_json::json!({"question": "temp tomorrow?", "command": "SELECT 1"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_command");
    }

    #[tokio::test]
    async fn bad_timestamp_is_a_bad_request() {
        let (status, body) = post(
            app_without_model(),
            "/history",
            serde_json::json!({"start": "soon", "end": "2025-08-01T00:00:00Z"}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_request");
    }
}
