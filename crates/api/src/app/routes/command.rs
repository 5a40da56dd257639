use std::sync::Arc;

use axum::{Json, extract::Extension, response::IntoResponse};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub async fn answer(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CommandBody>,
) -> axum::response::Response {
    match services.answer_command(&body.question, &body.command).await {
        Ok(outcome) => Json(dto::CommandResponse {
            run_id: outcome.run.run_id,
            command: outcome.command.to_string(),
            tags: outcome.tags,
            summary: outcome.summary,
        })
        .into_response(),
        Err(e) => errors::forecast_error_to_response(e),
    }
}
