mod analyze;
mod classrooms;
mod health;
mod stream;

use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;

use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze", post(analyze::analyze))
        .route("/classrooms", get(classrooms::list))
        .route("/classroom/:classroom_id/status", get(classrooms::status))
        .route("/classroom/:classroom_id/history", get(classrooms::history))
        .route("/classroom/:classroom_id/session", delete(classrooms::end_session))
        .route(
            "/classroom/:classroom_id/diagnostics",
            get(classrooms::diagnostics),
        )
        .route(
            "/classroom/:classroom_id/students/:student_id",
            delete(classrooms::evict_student),
        )
        .route("/ws/:classroom_id", get(stream::subscribe))
        .route("/health", get(health::health))
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("route not found").into_response()
}
