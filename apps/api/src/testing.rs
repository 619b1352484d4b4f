//! Test doubles and fixtures shared by the unit and scenario tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::courses::gateway::CourseGateway;
use crate::generation::contract::{GeneratedModule, LessonDraft, QuizDraft, Stage};
use crate::generation::pipeline::CoursePipeline;
use crate::llm_client::transport::{Transport, TransportError};
use crate::llm_client::{CompletionProvider, ProviderError, StagePrompt};
use crate::models::course::{LessonRow, ModuleRow};
use crate::models::profile::{Profile, ProfileDetails, ProfileInput, ToolsUsed};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::MemoryCourseStore;

// ────────────────────────────────────────────────────────────────────────────
// Canned stage outputs
// ────────────────────────────────────────────────────────────────────────────

pub const TOOLS_PRACTICES_JSON: &str = r#"{
  "ai_tools": [
    {"name": "ChatGPT", "category": "assistant", "use_cases": ["Draft campaign copy"]},
    {"name": "Canva Magic Design", "category": "design", "use_cases": ["Social visuals"]}
  ],
  "best_practices": [
    {"title": "Anonymise customer data", "description": "Strip names before prompting"},
    "Review every output before publishing"
  ]
}"#;

pub const COURSE_JSON: &str = r#"{
  "title": "AI for Retail Marketing",
  "modules": [
    {"title": "Prompting fundamentals", "description": "Structured prompts", "objectives": ["Write a role prompt"]},
    {"title": "Campaign content with AI", "description": "From brief to copy"},
    {"title": "Responsible use", "objectives": ["Spot hallucinations"]}
  ]
}"#;

pub const MODULE_JSON: &str = r#"{
  "title": "Prompting fundamentals",
  "lessons": [
    {"title": "Anatomy of a prompt", "content": "Role, task, context, format.", "orderIndex": 4},
    {"title": "Iterating on answers", "content": "Ask for revisions, not restarts."}
  ],
  "quiz": [
    {"question": "Which part sets the model's persona?", "options": ["Role", "Format"], "answer": 0},
    {"question": "What should you do with a weak answer?", "options": ["Restart", "Refine"], "answer": 1}
  ],
  "chatbot_context": "Prompt anatomy and iteration for marketing briefs."
}"#;

pub const LESSONS_JSON: &str = r#"{
  "lessons": [
    {"title": "Roles and personas", "content": "Give the model a role."},
    {"title": "Context windows", "content": "Paste the brief, not the whole drive."},
    {"title": "Output formats", "content": "Ask for tables when comparing."}
  ]
}"#;

pub const SUMMARY_JSON: &str = r#"{
  "summary": "You can now brief AI tools like a colleague.",
  "skills_gained": ["Prompt design", "Responsible AI use"],
  "certificate_text": "Completed AI for Retail Marketing"
}"#;

pub const REWRITE_JSON: &str = r#"{
  "id": "model-invented-id",
  "title": "Developed lesson",
  "content": "Deeper content.",
  "orderIndex": 9
}"#;

// ────────────────────────────────────────────────────────────────────────────
// Scripted completion provider
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
enum Script {
    Reply(String),
    Upstream(u16),
}

/// Answers each stage with a scripted reply and counts calls per stage.
pub struct FakeProvider {
    scripts: HashMap<Stage, Script>,
    calls: Mutex<Vec<Stage>>,
}

impl FakeProvider {
    /// Valid output for every stage.
    pub fn happy() -> Self {
        let scripts = [
            (Stage::ToolsPractices, TOOLS_PRACTICES_JSON),
            (Stage::GenerateCourse, COURSE_JSON),
            (Stage::GenerateModule, MODULE_JSON),
            (Stage::GenerateLessons, LESSONS_JSON),
            (Stage::GenerateSummary, SUMMARY_JSON),
            (Stage::DevelopLesson, REWRITE_JSON),
            (Stage::ContinueLesson, REWRITE_JSON),
        ]
        .into_iter()
        .map(|(stage, raw)| (stage, Script::Reply(raw.to_string())))
        .collect();
        Self {
            scripts,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with(mut self, stage: Stage, raw: &str) -> Self {
        self.scripts.insert(stage, Script::Reply(raw.to_string()));
        self
    }

    /// Makes `stage` fail with an upstream error carrying `status`.
    pub fn failing(mut self, stage: Stage, status: u16) -> Self {
        self.scripts.insert(stage, Script::Upstream(status));
        self
    }

    pub fn calls(&self, stage: Stage) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|s| **s == stage)
            .count()
    }
}

#[async_trait]
impl CompletionProvider for FakeProvider {
    async fn complete_json(&self, prompt: &StagePrompt) -> Result<String, ProviderError> {
        self.calls.lock().unwrap().push(prompt.stage);
        match self.scripts.get(&prompt.stage) {
            Some(Script::Reply(raw)) => Ok(raw.clone()),
            Some(Script::Upstream(status)) => Err(ProviderError::Upstream {
                status: Some(*status),
                message: "scripted upstream failure".to_string(),
            }),
            None => Ok("{}".to_string()),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recording transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Returns one fixed outcome for every request and records what was sent.
pub struct RecordingTransport {
    outcome: Result<Value, TransportError>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingTransport {
    pub fn ok(response: Value) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(response),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn err(status: Option<u16>, message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(TransportError {
                status,
                message: message.to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&'static str, String)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
            body: body.clone(),
        });
        self.outcome.clone()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub fn profile_input() -> ProfileInput {
    ProfileInput {
        job: "Responsable Marketing".to_string(),
        sector: "Retail".to_string(),
        ai_level: "beginner".to_string(),
        tools_used: Some(ToolsUsed::List(vec![json!("ChatGPT"), json!("Copilot")])),
        work_style: Some("hybrid".to_string()),
        details: ProfileDetails::default(),
    }
}

pub fn profile(user_id: &str) -> Profile {
    let input = profile_input();
    Profile {
        id: format!("profile-{user_id}"),
        user_id: user_id.to_string(),
        job: input.job,
        sector: input.sector,
        ai_level: input.ai_level,
        tools_used: input.tools_used,
        work_style: input.work_style,
        details: input.details,
        created_at: Utc::now(),
    }
}

pub fn module_row(id: &str, course_id: &str, order_index: i32) -> ModuleRow {
    ModuleRow {
        id: id.to_string(),
        course_id: course_id.to_string(),
        title: format!("Module {id}"),
        order_index,
        description: Some("What this module covers".to_string()),
        objectives: Some(json!(["One objective"])),
        chatbot_context: None,
        created_at: Utc::now(),
    }
}

pub fn lesson_row(id: &str, module_id: &str, order_index: i32) -> LessonRow {
    LessonRow {
        id: id.to_string(),
        module_id: module_id.to_string(),
        title: format!("Lesson {id}"),
        content: "Original lesson content.".to_string(),
        order_index,
        created_at: Utc::now(),
    }
}

pub fn generated_module(title: &str, lessons: usize, quiz: usize) -> GeneratedModule {
    GeneratedModule {
        title: title.to_string(),
        lessons: (0..lessons)
            .map(|i| LessonDraft {
                title: format!("Lesson {i}"),
                content: format!("Content {i}"),
                order_index: None,
            })
            .collect(),
        quiz: (0..quiz)
            .map(|i| QuizDraft {
                question: format!("Question {i}?"),
                answer_data: Map::from_iter([("answer".to_string(), json!(i))]),
            })
            .collect(),
        chatbot_context: format!("{title} digest"),
    }
}

/// The full router over an in-memory store, answered by `provider`.
pub fn test_app(provider: FakeProvider) -> Router {
    let gateway = CourseGateway::new(Arc::new(MemoryCourseStore::new()));
    build_router(AppState {
        pipeline: CoursePipeline::new(Arc::new(provider), gateway.clone()),
        gateway,
    })
}
