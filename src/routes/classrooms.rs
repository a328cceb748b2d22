use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::analysis::HistoryEntry;
use crate::response::{AppError, SuccessResponse};
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: usize = 20;

#[derive(Debug, Deserialize)]
pub(super) struct HistoryQuery {
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct HistoryDto {
    classroom_id: String,
    /// Total entries stored, not the number returned.
    count: usize,
    data: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
struct EndSessionDto {
    classroom_id: String,
    evicted: usize,
}

pub(super) async fn status(
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Result<Response, AppError> {
    let snapshot = state
        .service()
        .latest(&classroom_id)
        .ok_or_else(|| AppError::not_found(format!("classroom {classroom_id} not found")))?;
    Ok(SuccessResponse::new(snapshot).into_response())
}

pub(super) async fn history(
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    let (data, count) = state.service().history(&classroom_id, limit);
    SuccessResponse::new(HistoryDto {
        classroom_id,
        count,
        data,
    })
    .into_response()
}

pub(super) async fn end_session(
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Response {
    let evicted = state.service().end_session(&classroom_id);
    SuccessResponse::new(EndSessionDto {
        classroom_id,
        evicted,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
struct EvictStudentDto {
    classroom_id: String,
    student_id: String,
    evicted: bool,
}

pub(super) async fn diagnostics(
    State(state): State<AppState>,
    Path(classroom_id): Path<String>,
) -> Result<Response, AppError> {
    let diagnostics = state
        .service()
        .diagnostics(&classroom_id)
        .ok_or_else(|| AppError::not_found(format!("classroom {classroom_id} not found")))?;
    Ok(SuccessResponse::new(diagnostics).into_response())
}

pub(super) async fn evict_student(
    State(state): State<AppState>,
    Path((classroom_id, student_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    if !state.service().evict_student(&classroom_id, &student_id) {
        return Err(AppError::not_found(format!(
            "student {student_id} is not tracked in classroom {classroom_id}"
        )));
    }
    Ok(SuccessResponse::new(EvictStudentDto {
        classroom_id,
        student_id,
        evicted: true,
    })
    .into_response())
}

pub(super) async fn list(State(state): State<AppState>) -> Response {
    SuccessResponse::new(state.service().classrooms()).into_response()
}
