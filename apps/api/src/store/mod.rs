//! Storage port for profiles and course content.
//!
//! Row-level reads plus one write method per generation stage. Each write method is
//! atomic on its own; nothing groups writes across stages, so an interrupted run
//! leaves a course with only some of its modules generated.
//!
//! Ownership is NOT checked here; `courses::gateway` does that.

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::AppError;
use crate::models::course::{CourseListRow, CourseRow, LessonRow, ModuleRow, QuizItemRow};
use crate::models::profile::ProfileRow;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCourseStore;
pub use postgres::PgCourseStore;

pub type StoreResult<T> = Result<T, AppError>;

#[async_trait]
pub trait CourseStore: Send + Sync {
    // --- Profiles ---
    async fn insert_profile(&self, profile: &ProfileRow) -> StoreResult<()>;

    /// Newest profile for the user, if any.
    async fn latest_profile(&self, user_id: &str) -> StoreResult<Option<ProfileRow>>;

    // --- Courses ---
    /// Writes a course together with its (not yet generated) modules.
    async fn insert_course_outline(&self, course: &CourseRow, modules: &[ModuleRow])
        -> StoreResult<()>;

    async fn get_course(&self, course_id: &str) -> StoreResult<Option<CourseRow>>;

    /// Newest first; ties broken by id.
    async fn list_courses_by_user(&self, user_id: &str) -> StoreResult<Vec<CourseListRow>>;

    async fn update_course_summary(
        &self,
        course_id: &str,
        summary: &str,
        skills_gained: &Value,
        certificate_text: &str,
    ) -> StoreResult<()>;

    // --- Modules ---
    async fn get_module(&self, module_id: &str) -> StoreResult<Option<ModuleRow>>;

    /// Ordered by `order_index`.
    async fn list_modules(&self, course_id: &str) -> StoreResult<Vec<ModuleRow>>;

    /// Updates the module's title and chatbot context and swaps its lessons and quiz
    /// for the given ones.
    async fn replace_module_content(
        &self,
        module: &ModuleRow,
        lessons: &[LessonRow],
        quiz: &[QuizItemRow],
    ) -> StoreResult<()>;

    /// Swaps the module's lessons, leaving its quiz untouched.
    async fn replace_module_lessons(&self, module_id: &str, lessons: &[LessonRow])
        -> StoreResult<()>;

    // --- Lessons & quiz ---
    async fn get_lesson(&self, lesson_id: &str) -> StoreResult<Option<LessonRow>>;

    /// Ordered by `order_index`.
    async fn list_lessons(&self, module_id: &str) -> StoreResult<Vec<LessonRow>>;

    /// Persists a lesson's title and content.
    async fn update_lesson(&self, lesson: &LessonRow) -> StoreResult<()>;

    /// Ordered by `position`.
    async fn list_quiz_items(&self, module_id: &str) -> StoreResult<Vec<QuizItemRow>>;
}
