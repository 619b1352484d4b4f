//! Stage contracts: the JSON shape each generation stage must produce.
//!
//! Each stage declares its top-level fields as `FieldRule`s. `generation::validator`
//! walks the rules against the model output; only output that passes is deserialized
//! into the stage's typed result below.
//!
//! # Rules
//! - Required fields must be present with the declared kind. Required strings must not be blank.
//! - Optional fields with the wrong kind are coerced to `null`, never rejected.
//! - Array items are checked against their item rules; a bad item fails the stage.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ToolsPractices,
    GenerateCourse,
    GenerateModule,
    GenerateLessons,
    GenerateSummary,
    DevelopLesson,
    ContinueLesson,
}

impl Stage {
    pub fn name(self) -> &'static str {
        match self {
            Stage::ToolsPractices => "tools-practices",
            Stage::GenerateCourse => "generate-course",
            Stage::GenerateModule => "generate-module",
            Stage::GenerateLessons => "generate-lessons",
            Stage::GenerateSummary => "generate-summary",
            Stage::DevelopLesson => "develop-lesson",
            Stage::ContinueLesson => "continue-lesson",
        }
    }

    /// Top-level fields the stage's JSON object must carry.
    pub fn rules(self) -> &'static [FieldRule] {
        match self {
            Stage::ToolsPractices => TOOLS_PRACTICES,
            Stage::GenerateCourse => COURSE_OUTLINE,
            Stage::GenerateModule => MODULE_CONTENT,
            Stage::GenerateLessons => LESSON_BATCH,
            Stage::GenerateSummary => COURSE_SUMMARY,
            Stage::DevelopLesson | Stage::ContinueLesson => LESSON_REWRITE,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field rules
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub enum Items {
    Any,
    Strings,
    Objects(&'static [FieldRule]),
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    String,
    Number,
    Array { items: Items, non_empty: bool },
    /// Present, any JSON value.
    Any,
}

impl FieldKind {
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::String => "a string",
            FieldKind::Number => "a number",
            FieldKind::Array { .. } => "an array",
            FieldKind::Any => "a value",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub key: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(key: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        key,
        kind,
        required: true,
    }
}

const fn optional(key: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule {
        key,
        kind,
        required: false,
    }
}

const fn array_of(items: Items) -> FieldKind {
    FieldKind::Array {
        items,
        non_empty: false,
    }
}

const fn non_empty_array_of(items: Items) -> FieldKind {
    FieldKind::Array {
        items,
        non_empty: true,
    }
}

const MODULE_ITEM: &[FieldRule] = &[
    required("title", FieldKind::String),
    optional("description", FieldKind::String),
    optional("objectives", array_of(Items::Any)),
];

const LESSON_ITEM: &[FieldRule] = &[
    required("title", FieldKind::String),
    required("content", FieldKind::String),
    optional("orderIndex", FieldKind::Number),
];

const QUIZ_ITEM: &[FieldRule] = &[required("question", FieldKind::String)];

const TOOLS_PRACTICES: &[FieldRule] = &[
    required("ai_tools", array_of(Items::Any)),
    required("best_practices", array_of(Items::Any)),
];

const COURSE_OUTLINE: &[FieldRule] = &[
    required("title", FieldKind::String),
    required("modules", non_empty_array_of(Items::Objects(MODULE_ITEM))),
];

const MODULE_CONTENT: &[FieldRule] = &[
    required("title", FieldKind::String),
    required("lessons", non_empty_array_of(Items::Objects(LESSON_ITEM))),
    required("quiz", non_empty_array_of(Items::Objects(QUIZ_ITEM))),
    required("chatbot_context", FieldKind::String),
];

const LESSON_BATCH: &[FieldRule] = &[required(
    "lessons",
    non_empty_array_of(Items::Objects(LESSON_ITEM)),
)];

const COURSE_SUMMARY: &[FieldRule] = &[
    required("summary", FieldKind::String),
    required("skills_gained", array_of(Items::Strings)),
    required("certificate_text", FieldKind::String),
];

const LESSON_REWRITE: &[FieldRule] = &[
    required("title", FieldKind::String),
    required("content", FieldKind::String),
    optional("id", FieldKind::String),
    optional("orderIndex", FieldKind::Number),
    optional("module", FieldKind::Any),
];

// ────────────────────────────────────────────────────────────────────────────
// Typed stage outputs
// ────────────────────────────────────────────────────────────────────────────

/// Stage 1. Both lists are kept verbatim on the course that consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsPractices {
    pub ai_tools: Vec<Value>,
    pub best_practices: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub objectives: Option<Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseOutline {
    pub title: String,
    pub modules: Vec<ModuleDraft>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonDraft {
    pub title: String,
    pub content: String,
    /// Model's suggestion only; positions are always reassigned.
    #[serde(default, rename = "orderIndex")]
    pub order_index: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizDraft {
    pub question: String,
    #[serde(flatten)]
    pub answer_data: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedModule {
    pub title: String,
    pub lessons: Vec<LessonDraft>,
    pub quiz: Vec<QuizDraft>,
    pub chatbot_context: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonBatch {
    pub lessons: Vec<LessonDraft>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseSummary {
    pub summary: String,
    pub skills_gained: Vec<String>,
    pub certificate_text: String,
}

/// Output of develop-lesson and continue-lesson. Identity fields echoed by the
/// model are parsed but never trusted.
#[derive(Debug, Clone, Deserialize)]
pub struct LessonRewrite {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "orderIndex")]
    pub order_index: Option<f64>,
    #[serde(default)]
    pub module: Option<Value>,
}
