//! API-shaped read models. Field names follow the public JSON contract, which mixes
//! camelCase (`orderIndex`, `rawAiTools`) with snake_case (`module_id`, `chatbot_context`).

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::course::{CourseListRow, CourseRow, LessonRow, ModuleRow, QuizItemRow};

#[derive(Debug, Clone, Serialize)]
pub struct BestPracticesSnapshot {
    pub items: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSummary {
    pub id: String,
    pub title: String,
    pub order_index: i32,
    pub description: Option<String>,
    pub objectives: Option<Value>,
    pub lessons: Vec<LessonSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAggregate {
    pub id: String,
    pub title: String,
    pub raw_ai_tools: Value,
    pub raw_best_practices: Value,
    pub summary: Option<String>,
    pub certificate_text: Option<String>,
    pub skills_gained: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub modules: Vec<ModuleSummary>,
    #[serde(rename = "best_practices")]
    pub best_practices: BestPracticesSnapshot,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonView {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "orderIndex")]
    pub order_index: i32,
}

/// A quiz item with its answer data flattened next to the question.
#[derive(Debug, Clone, Serialize)]
pub struct QuizItemView {
    pub id: String,
    pub question: String,
    #[serde(flatten)]
    pub answer_data: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleDetail {
    pub module_id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    pub objectives: Option<Value>,
    #[serde(rename = "orderIndex")]
    pub order_index: i32,
    pub lessons: Vec<LessonView>,
    pub quiz: Vec<QuizItemView>,
    pub chatbot_context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonDetail {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "orderIndex")]
    pub order_index: i32,
    pub module: ModuleRef,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseListItem {
    pub id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub modules_count: i64,
}

/// One module of a freshly generated outline.
#[derive(Debug, Clone, Serialize)]
pub struct OutlineModule {
    pub module_id: String,
    pub title: String,
    pub description: Option<String>,
    pub objectives: Option<Value>,
    #[serde(rename = "orderIndex")]
    pub order_index: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseOutlineView {
    pub course_id: String,
    pub title: String,
    pub modules: Vec<OutlineModule>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonBatchView {
    pub module_id: String,
    pub lessons: Vec<LessonView>,
}

impl From<&LessonRow> for LessonSummary {
    fn from(row: &LessonRow) -> Self {
        Self {
            id: row.id.clone(),
            title: row.title.clone(),
            order_index: row.order_index,
        }
    }
}

impl From<&LessonRow> for LessonView {
    fn from(row: &LessonRow) -> Self {
        Self {
            id: row.id.clone(),
            title: row.title.clone(),
            content: row.content.clone(),
            order_index: row.order_index,
        }
    }
}

impl From<&QuizItemRow> for QuizItemView {
    fn from(row: &QuizItemRow) -> Self {
        let answer_data = match &row.answer_data {
            Value::Object(map) => map.clone(),
            Value::Null => Map::new(),
            other => Map::from_iter([("answer_data".to_string(), other.clone())]),
        };
        Self {
            id: row.id.clone(),
            question: row.question.clone(),
            answer_data,
        }
    }
}

impl From<&ModuleRow> for OutlineModule {
    fn from(row: &ModuleRow) -> Self {
        Self {
            module_id: row.id.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            objectives: row.objectives.clone(),
            order_index: row.order_index,
        }
    }
}

impl From<CourseListRow> for CourseListItem {
    fn from(row: CourseListRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            created_at: row.created_at,
            modules_count: row.modules_count,
        }
    }
}

impl ModuleDetail {
    pub fn new(module: &ModuleRow, lessons: &[LessonRow], quiz: &[QuizItemRow]) -> Self {
        Self {
            module_id: module.id.clone(),
            course_id: module.course_id.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            objectives: module.objectives.clone(),
            order_index: module.order_index,
            lessons: lessons.iter().map(LessonView::from).collect(),
            quiz: quiz.iter().map(QuizItemView::from).collect(),
            chatbot_context: module.chatbot_context.clone(),
        }
    }
}

impl LessonDetail {
    pub fn new(lesson: &LessonRow, module: &ModuleRow) -> Self {
        Self {
            id: lesson.id.clone(),
            title: lesson.title.clone(),
            content: lesson.content.clone(),
            order_index: lesson.order_index,
            module: ModuleRef {
                id: module.id.clone(),
                title: module.title.clone(),
            },
        }
    }
}

impl CourseAggregate {
    pub fn new(course: CourseRow, modules: Vec<ModuleSummary>) -> Self {
        let best_practices = BestPracticesSnapshot {
            items: course.raw_best_practices.clone(),
        };
        Self {
            id: course.id,
            title: course.title,
            raw_ai_tools: course.raw_ai_tools,
            raw_best_practices: course.raw_best_practices,
            summary: course.summary,
            certificate_text: course.certificate_text,
            skills_gained: course.skills_gained,
            created_at: course.created_at,
            modules,
            best_practices,
        }
    }
}

impl ModuleSummary {
    pub fn new(module: &ModuleRow, lessons: &[LessonRow]) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            order_index: module.order_index,
            description: module.description.clone(),
            objectives: module.objectives.clone(),
            lessons: lessons.iter().map(LessonSummary::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{lesson_row, module_row};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn test_quiz_answer_data_is_flattened() {
        let row = QuizItemRow {
            id: "q1".to_string(),
            module_id: "m1".to_string(),
            position: 0,
            question: "Which?".to_string(),
            answer_data: json!({ "options": ["a", "b"], "answer": 1 }),
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(QuizItemView::from(&row)).unwrap();
        assert_eq!(value["question"], "Which?");
        assert_eq!(value["answer"], 1);
        assert_eq!(value["options"], json!(["a", "b"]));
    }

    #[test]
    fn test_module_detail_wire_names() {
        let module = module_row("m1", "c1", 2);
        let lessons = vec![lesson_row("l1", "m1", 0)];
        let value = serde_json::to_value(ModuleDetail::new(&module, &lessons, &[])).unwrap();
        assert_eq!(value["module_id"], "m1");
        assert_eq!(value["orderIndex"], 2);
        assert_eq!(value["lessons"][0]["orderIndex"], 0);
        assert!(value.get("chatbot_context").is_some());
    }

    #[test]
    fn test_aggregate_exposes_best_practices_snapshot() {
        let course = CourseRow {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            title: "T".to_string(),
            raw_ai_tools: json!([{ "name": "ChatGPT" }]),
            raw_best_practices: json!(["Check sources"]),
            summary: None,
            certificate_text: None,
            skills_gained: None,
            created_at: Utc::now(),
        };
        let value = serde_json::to_value(CourseAggregate::new(course, vec![])).unwrap();
        assert_eq!(value["rawAiTools"], json!([{ "name": "ChatGPT" }]));
        assert_eq!(value["best_practices"]["items"], json!(["Check sources"]));
        assert!(value["summary"].is_null());
    }
}
