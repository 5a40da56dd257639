use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn query(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::HistoryBody>,
) -> axum::response::Response {
    let (tags, start, end) = match body.parts() {
        Ok(parts) => parts,
        Err(resp) => return resp,
    };

    match services.history(&tags, start, end).await {
        Ok(readings) => Json(dto::HistoryResponse { readings }).into_response(),
        Err(e) => errors::forecast_error_to_response(e),
    }
}
