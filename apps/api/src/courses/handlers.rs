//! Axum route handlers for reading courses, modules and lessons.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::auth::Caller;
use crate::courses::views::{CourseAggregate, CourseListItem, LessonDetail, ModuleDetail};
use crate::errors::AppError;
use crate::state::AppState;

/// GET /course/:id
pub async fn handle_get_course(
    State(state): State<AppState>,
    caller: Caller,
    Path(course_id): Path<String>,
) -> Result<Json<CourseAggregate>, AppError> {
    Ok(Json(state.gateway.get_aggregate(&course_id, &caller.id).await?))
}

/// GET /courses/by-user/:user_id
///
/// Only the user themself may list their courses.
pub async fn handle_courses_by_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<CourseListItem>>, AppError> {
    if user_id != caller.id {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }
    Ok(Json(state.gateway.get_by_user(&user_id).await?))
}

/// GET /module/:id
pub async fn handle_get_module(
    State(state): State<AppState>,
    caller: Caller,
    Path(module_id): Path<String>,
) -> Result<Json<ModuleDetail>, AppError> {
    Ok(Json(
        state.gateway.get_module_detail(&module_id, &caller.id).await?,
    ))
}

/// GET /lesson/:id
pub async fn handle_get_lesson(
    State(state): State<AppState>,
    caller: Caller,
    Path(lesson_id): Path<String>,
) -> Result<Json<LessonDetail>, AppError> {
    Ok(Json(
        state.gateway.get_lesson_detail(&lesson_id, &caller.id).await?,
    ))
}
