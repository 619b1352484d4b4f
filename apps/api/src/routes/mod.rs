pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::courses::handlers as courses;
use crate::generation::handlers as generation;
use crate::profile::handlers as profile;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/profile", post(profile::handle_create_profile))
        // Generation stages
        .route("/ai/run-pipeline", post(generation::handle_run_pipeline))
        .route("/ai/tools-practices", post(generation::handle_tools_practices))
        .route("/ai/generate-course", post(generation::handle_generate_course))
        .route("/ai/generate-module", post(generation::handle_generate_module))
        .route("/ai/generate-lessons", post(generation::handle_generate_lessons))
        .route("/ai/generate-summary", post(generation::handle_generate_summary))
        .route("/ai/develop-lesson", post(generation::handle_develop_lesson))
        .route("/ai/continue-lesson", post(generation::handle_continue_lesson))
        // Reads
        .route("/course/:id", get(courses::handle_get_course))
        .route("/courses/by-user/:user_id", get(courses::handle_courses_by_user))
        .route("/module/:id", get(courses::handle_get_module))
        .route("/lesson/:id", get(courses::handle_get_lesson))
        .with_state(state)
}
