use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn forecast(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ForecastBody>,
) -> axum::response::Response {
    let request = match body.into_request() {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.forecast(&request).await {
        Ok(run) => Json(dto::ForecastResponse {
            run_id: run.run_id,
            records: run.records,
        })
        .into_response(),
        Err(e) => errors::forecast_error_to_response(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ForecastBody>,
) -> axum::response::Response {
    let request = match body.into_request() {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    match services.forecast_summary(&request).await {
        Ok((run, summary)) => Json(dto::SummaryResponse {
            run_id: run.run_id,
            records: run.records,
            summary,
        })
        .into_response(),
        Err(e) => errors::forecast_error_to_response(e),
    }
}
