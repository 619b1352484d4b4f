//! Axum route handlers for the generation stages. Every stage answers `201 Created`.

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Caller;
use crate::courses::gateway::ModuleKey;
use crate::courses::views::{CourseOutlineView, LessonBatchView, LessonDetail, ModuleDetail};
use crate::errors::AppError;
use crate::generation::contract::{CourseSummary, ToolsPractices};
use crate::state::AppState;

type Created<T> = Result<(StatusCode, Json<T>), AppError>;

fn created<T>(body: T) -> Created<T> {
    Ok((StatusCode::CREATED, Json(body)))
}

fn require_id(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateCourseRequest {
    pub ai_tools: Vec<Value>,
    #[serde(default)]
    pub best_practices: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateModuleRequest {
    pub course_id: String,
    pub module_index_or_id: ModuleKey,
    /// Draft from the course outline. Defaults to the stored module.
    #[serde(default)]
    pub module: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateLessonsRequest {
    pub module_id: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateSummaryRequest {
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct LessonRequest {
    pub lesson_id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /ai/run-pipeline
pub async fn handle_run_pipeline(
    State(state): State<AppState>,
    caller: Caller,
) -> Created<CourseOutlineView> {
    created(state.pipeline.run_full_pipeline(&caller.id).await?)
}

/// POST /ai/tools-practices
pub async fn handle_tools_practices(
    State(state): State<AppState>,
    caller: Caller,
) -> Created<ToolsPractices> {
    created(state.pipeline.tools_practices(&caller.id).await?)
}

/// POST /ai/generate-course
pub async fn handle_generate_course(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<GenerateCourseRequest>,
) -> Created<CourseOutlineView> {
    created(
        state
            .pipeline
            .generate_course(&caller.id, request.ai_tools, request.best_practices)
            .await?,
    )
}

/// POST /ai/generate-module
pub async fn handle_generate_module(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<GenerateModuleRequest>,
) -> Created<ModuleDetail> {
    require_id("course_id", &request.course_id)?;
    created(
        state
            .pipeline
            .generate_module(
                &caller.id,
                &request.course_id,
                &request.module_index_or_id,
                request.module,
            )
            .await?,
    )
}

/// POST /ai/generate-lessons
pub async fn handle_generate_lessons(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<GenerateLessonsRequest>,
) -> Created<LessonBatchView> {
    require_id("module_id", &request.module_id)?;
    created(
        state
            .pipeline
            .generate_lessons(&caller.id, &request.module_id)
            .await?,
    )
}

/// POST /ai/generate-summary
pub async fn handle_generate_summary(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<GenerateSummaryRequest>,
) -> Created<CourseSummary> {
    require_id("course_id", &request.course_id)?;
    created(
        state
            .pipeline
            .generate_summary(&caller.id, &request.course_id)
            .await?,
    )
}

/// POST /ai/develop-lesson
pub async fn handle_develop_lesson(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<LessonRequest>,
) -> Created<LessonDetail> {
    require_id("lesson_id", &request.lesson_id)?;
    created(
        state
            .pipeline
            .develop_lesson(&caller.id, &request.lesson_id)
            .await?,
    )
}

/// POST /ai/continue-lesson
pub async fn handle_continue_lesson(
    State(state): State<AppState>,
    caller: Caller,
    Json(request): Json<LessonRequest>,
) -> Created<LessonDetail> {
    require_id("lesson_id", &request.lesson_id)?;
    created(
        state
            .pipeline
            .continue_lesson(&caller.id, &request.lesson_id)
            .await?,
    )
}
