use axum::{Router, routing::post};

pub mod command;
pub mod forecast;
pub mod history;
pub mod system;

/// Router for every forecasting endpoint.
pub fn router() -> Router {
    Router::new()
        .route("/forecast", post(forecast::forecast))
        .route("/forecast/summary", post(forecast::summary))
        .route("/command", post(command::answer))
        .route("/history", post(history::query))
}
