use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CourseRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Stage-1 `ai_tools`, verbatim.
    pub raw_ai_tools: Value,
    /// Stage-1 `best_practices`, verbatim. Also the course's best-practices snapshot.
    pub raw_best_practices: Value,
    pub summary: Option<String>,
    pub certificate_text: Option<String>,
    pub skills_gained: Option<Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModuleRow {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub order_index: i32,
    pub description: Option<String>,
    pub objectives: Option<Value>,
    /// Empty until the module's content has been generated.
    pub chatbot_context: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LessonRow {
    pub id: String,
    pub module_id: String,
    pub title: String,
    pub content: String,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizItemRow {
    pub id: String,
    pub module_id: String,
    /// Array position as generated; not a user-facing order index.
    pub position: i32,
    pub question: String,
    /// Every other key the model produced for this item (options, answer, explanation...).
    pub answer_data: Value,
    pub created_at: DateTime<Utc>,
}

/// A course listing entry with its module count, as returned by the store.
#[derive(Debug, Clone, FromRow)]
pub struct CourseListRow {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub modules_count: i64,
}
