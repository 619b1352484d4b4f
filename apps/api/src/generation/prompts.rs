// Stage prompt templates and builders.
// Cross-cutting fragments (JSON-only, grounding, language) come from llm_client::prompts.

use serde_json::{json, Value};

use crate::generation::contract::Stage;
use crate::llm_client::prompts::{language_instruction, GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::StagePrompt;
use crate::models::course::{CourseRow, LessonRow, ModuleRow};
use crate::models::profile::Profile;

const COACH_ROLE: &str = "You are an expert corporate trainer who designs practical AI upskilling \
    courses for working professionals.";

/// Replace: {profile}
const TOOLS_PRACTICES_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

Recommend the AI tools this learner should master and the best practices for using them at work.

Return a JSON object with this EXACT schema:
{
  "ai_tools": [
    {"name": "ChatGPT", "category": "assistant", "use_cases": ["Draft client emails"], "why": "Saves time on routine writing"}
  ],
  "best_practices": [
    {"title": "Never paste confidential data", "description": "Anonymise customer data before prompting"}
  ]
}

Rules:
- 4 to 8 tools, ordered from most to least useful for this job
- 4 to 8 best practices covering quality, privacy and compliance"#;

/// Replace: {profile}, {ai_tools}, {best_practices}
const COURSE_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

SELECTED AI TOOLS:
{ai_tools}

BEST PRACTICES TO REINFORCE:
{best_practices}

Design a course outline that teaches this learner to use the selected tools in their daily work.

Return a JSON object with this EXACT schema:
{
  "title": "AI for Retail Marketing Managers",
  "modules": [
    {"title": "Prompting fundamentals", "description": "What the module covers", "objectives": ["Write a structured prompt"]}
  ]
}

Rules:
- 3 to 6 modules, in the order they should be taught
- Each module builds on the previous one"#;

/// Replace: {profile}, {course_title}, {position}, {module_count}, {module}
const MODULE_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

COURSE: {course_title}
MODULE {position} OF {module_count}:
{module}

Write the full content of this module.

Return a JSON object with this EXACT schema:
{
  "title": "Module title",
  "lessons": [
    {"title": "Lesson title", "content": "Full lesson text in markdown, with a worked example"}
  ],
  "quiz": [
    {"question": "Question text", "options": ["A", "B", "C", "D"], "answer": 0, "explanation": "Why A is right"}
  ],
  "chatbot_context": "A compact digest of this module a tutoring assistant can rely on"
}

Rules:
- 3 to 5 lessons and 3 to 5 quiz questions
- Every quiz question must be answerable from the lessons
- chatbot_context stays under 150 words"#;

/// Replace: {profile}, {course_title}, {module}, {existing}
const LESSONS_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

COURSE: {course_title}
MODULE:
{module}

CURRENT LESSONS (to be replaced):
{existing}

Write a fresh set of lessons for this module.

Return a JSON object with this EXACT schema:
{
  "lessons": [
    {"title": "Lesson title", "content": "Full lesson text in markdown, with a worked example"}
  ]
}

Rules:
- 3 to 5 lessons, in teaching order"#;

/// Replace: {profile}, {course_title}, {modules}
const SUMMARY_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

COURSE: {course_title}
MODULES:
{modules}

Summarize what the learner achieves by completing this course.

Return a JSON object with this EXACT schema:
{
  "summary": "One paragraph course summary",
  "skills_gained": ["Skill one", "Skill two"],
  "certificate_text": "Text printed on the completion certificate"
}"#;

/// Replace: {profile}, {module_title}, {lesson}, {instruction}
const LESSON_REWRITE_TEMPLATE: &str = r#"LEARNER PROFILE:
{profile}

MODULE: {module_title}
LESSON:
{lesson}

{instruction}

Return a JSON object with this EXACT schema:
{
  "title": "Lesson title",
  "content": "Lesson text in markdown"
}"#;

const DEVELOP_INSTRUCTION: &str = "Rewrite this lesson into a deeper, more complete version: \
    add concrete workplace examples, step-by-step guidance and common pitfalls. \
    Return the complete rewritten lesson.";

const CONTINUE_INSTRUCTION: &str = "Continue this lesson where it stops. \
    Return ONLY the new material in `content`; do not repeat existing text. \
    Keep the lesson's title.";

fn system_prompt(profile: &Profile) -> String {
    format!(
        "{COACH_ROLE}\n{JSON_ONLY_SYSTEM}\n{GROUNDING_INSTRUCTION}\n{}",
        language_instruction(profile.details.language.as_deref())
    )
}

fn stage_prompt(stage: Stage, profile: &Profile, user: String) -> StagePrompt {
    StagePrompt {
        stage,
        system: system_prompt(profile),
        user,
    }
}

pub fn tools_practices(profile: &Profile) -> StagePrompt {
    let user = TOOLS_PRACTICES_TEMPLATE.replace("{profile}", &profile.prompt_digest());
    stage_prompt(Stage::ToolsPractices, profile, user)
}

pub fn generate_course(profile: &Profile, ai_tools: &[Value], best_practices: &[Value]) -> StagePrompt {
    let user = COURSE_TEMPLATE
        .replace("{profile}", &profile.prompt_digest())
        .replace("{ai_tools}", &Value::from(ai_tools.to_vec()).to_string())
        .replace("{best_practices}", &Value::from(best_practices.to_vec()).to_string());
    stage_prompt(Stage::GenerateCourse, profile, user)
}

/// `position` is zero-based.
pub fn generate_module(
    profile: &Profile,
    course_title: &str,
    draft: &Value,
    position: usize,
    module_count: usize,
) -> StagePrompt {
    let user = MODULE_TEMPLATE
        .replace("{profile}", &profile.prompt_digest())
        .replace("{course_title}", course_title)
        .replace("{position}", &(position + 1).to_string())
        .replace("{module_count}", &module_count.to_string())
        .replace("{module}", &draft.to_string());
    stage_prompt(Stage::GenerateModule, profile, user)
}

pub fn generate_lessons(
    profile: &Profile,
    course_title: &str,
    module: &ModuleRow,
    existing: &[LessonRow],
) -> StagePrompt {
    let existing: Vec<&str> = existing.iter().map(|l| l.title.as_str()).collect();
    let user = LESSONS_TEMPLATE
        .replace("{profile}", &profile.prompt_digest())
        .replace("{course_title}", course_title)
        .replace("{module}", &module_digest(module).to_string())
        .replace("{existing}", &json!(existing).to_string());
    stage_prompt(Stage::GenerateLessons, profile, user)
}

pub fn generate_summary(profile: &Profile, course: &CourseRow, modules: &[ModuleRow]) -> StagePrompt {
    let modules: Vec<Value> = modules.iter().map(module_digest).collect();
    let user = SUMMARY_TEMPLATE
        .replace("{profile}", &profile.prompt_digest())
        .replace("{course_title}", &course.title)
        .replace("{modules}", &Value::from(modules).to_string());
    stage_prompt(Stage::GenerateSummary, profile, user)
}

pub fn develop_lesson(profile: &Profile, module_title: &str, lesson: &LessonRow) -> StagePrompt {
    lesson_rewrite(Stage::DevelopLesson, DEVELOP_INSTRUCTION, profile, module_title, lesson)
}

pub fn continue_lesson(profile: &Profile, module_title: &str, lesson: &LessonRow) -> StagePrompt {
    lesson_rewrite(Stage::ContinueLesson, CONTINUE_INSTRUCTION, profile, module_title, lesson)
}

fn lesson_rewrite(
    stage: Stage,
    instruction: &str,
    profile: &Profile,
    module_title: &str,
    lesson: &LessonRow,
) -> StagePrompt {
    let lesson = json!({ "title": lesson.title, "content": lesson.content });
    let user = LESSON_REWRITE_TEMPLATE
        .replace("{profile}", &profile.prompt_digest())
        .replace("{module_title}", module_title)
        .replace("{lesson}", &lesson.to_string())
        .replace("{instruction}", instruction);
    stage_prompt(stage, profile, user)
}

fn module_digest(module: &ModuleRow) -> Value {
    json!({
        "title": module.title,
        "description": module.description,
        "objectives": module.objectives,
    })
}
