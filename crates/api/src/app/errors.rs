use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::{error, warn};

use sensorcast_core::ForecastError;

pub fn forecast_error_to_response(err: ForecastError) -> axum::response::Response {
    let status = match &err {
        ForecastError::ModelLoad(_) | ForecastError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        ForecastError::DataSource(_) => StatusCode::BAD_GATEWAY,
        ForecastError::InsufficientHistory { .. }
        | ForecastError::EmptyChannel(_)
        | ForecastError::InvalidHistory(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ForecastError::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
        ForecastError::InvalidCommand(_) | ForecastError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
    };

    if status.is_server_error() {
        error!(code = err.code(), error = %err, "request failed");
    } else {
        warn!(code = err.code(), error = %err, "request rejected");
    }

    json_error(status, err.code(), err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
