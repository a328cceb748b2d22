use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::analysis::AnalysisRequest;
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

pub(super) async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(error = %rejection, "rejected analysis payload");
        AppError::validation(rejection.body_text())
    })?;

    let classroom_id = request.classroom_id.clone();
    let students = request.students.len();
    let snapshot = state.service().analyze(request).map_err(|err| {
        tracing::warn!(classroom_id = %classroom_id, students, error = %err, "analysis rejected");
        AppError::from(err)
    })?;

    Ok(SuccessResponse::new(snapshot).into_response())
}
