//! Pipeline orchestrator.
//!
//! Stages run strictly in sequence: tools-practices → generate-course → generate-module
//! (once per module, ascending) → generate-summary. Each stage persists its own output
//! before the next begins, and the first failure stops the run. Nothing already written
//! is rolled back, so any single stage can be re-entered on its own.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::info;

use crate::courses::gateway::{CourseGateway, ModuleKey};
use crate::courses::views::{
    CourseOutlineView, LessonBatchView, LessonDetail, LessonView, ModuleDetail, OutlineModule,
};
use crate::errors::AppError;
use crate::generation::contract::{
    CourseOutline, CourseSummary, GeneratedModule, LessonBatch, LessonRewrite, Stage,
    ToolsPractices,
};
use crate::generation::prompts;
use crate::generation::validator::validate_as;
use crate::llm_client::{CompletionProvider, StagePrompt};
use crate::models::course::LessonRow;

#[derive(Clone)]
pub struct CoursePipeline {
    provider: Arc<dyn CompletionProvider>,
    gateway: CourseGateway,
}

impl CoursePipeline {
    pub fn new(provider: Arc<dyn CompletionProvider>, gateway: CourseGateway) -> Self {
        Self { provider, gateway }
    }

    /// One model call, validated against the prompt's stage.
    async fn run_stage<T: DeserializeOwned>(&self, prompt: StagePrompt) -> Result<T, AppError> {
        let raw = self.provider.complete_json(&prompt).await?;
        validate_as(prompt.stage, &raw)
    }

    /// Runs every stage for the caller's latest profile and returns the new course outline.
    pub async fn run_full_pipeline(&self, caller_id: &str) -> Result<CourseOutlineView, AppError> {
        info!(user_id = caller_id, "Full pipeline started");

        let tools = self.tools_practices(caller_id).await?;
        let outline = self
            .generate_course(caller_id, tools.ai_tools, Some(tools.best_practices))
            .await?;

        for module in &outline.modules {
            self.generate_module(
                caller_id,
                &outline.course_id,
                &ModuleKey::Id(module.module_id.clone()),
                None,
            )
            .await?;
        }

        self.generate_summary(caller_id, &outline.course_id).await?;

        // generate-module retitles modules, so report what was stored.
        let modules = self.gateway.list_modules(&outline.course_id).await?;
        info!(
            user_id = caller_id,
            course_id = %outline.course_id,
            modules = modules.len(),
            "Full pipeline finished"
        );
        Ok(CourseOutlineView {
            modules: modules.iter().map(OutlineModule::from).collect(),
            ..outline
        })
    }

    pub async fn tools_practices(&self, caller_id: &str) -> Result<ToolsPractices, AppError> {
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(user_id = caller_id, stage = %Stage::ToolsPractices, "Stage started");
        self.run_stage(prompts::tools_practices(&profile)).await
    }

    /// Always creates a new course; earlier courses are never reused.
    pub async fn generate_course(
        &self,
        caller_id: &str,
        ai_tools: Vec<Value>,
        best_practices: Option<Vec<Value>>,
    ) -> Result<CourseOutlineView, AppError> {
        let profile = self.gateway.latest_profile(caller_id).await?;
        let best_practices = best_practices.unwrap_or_default();
        info!(user_id = caller_id, stage = %Stage::GenerateCourse, "Stage started");

        let outline: CourseOutline = self
            .run_stage(prompts::generate_course(&profile, &ai_tools, &best_practices))
            .await?;
        let (course, modules) = self
            .gateway
            .create_course(
                caller_id,
                &outline.title,
                &ai_tools,
                &best_practices,
                &outline.modules,
            )
            .await?;

        info!(
            user_id = caller_id,
            course_id = %course.id,
            modules = modules.len(),
            "Course outline stored"
        );
        Ok(CourseOutlineView {
            course_id: course.id,
            title: course.title,
            modules: modules.iter().map(OutlineModule::from).collect(),
        })
    }

    /// Generates (or regenerates) one module's lessons and quiz. Without a `draft`,
    /// the stored module's title, description and objectives are used.
    pub async fn generate_module(
        &self,
        caller_id: &str,
        course_id: &str,
        key: &ModuleKey,
        draft: Option<Value>,
    ) -> Result<ModuleDetail, AppError> {
        let course = self.gateway.owned_course(course_id, caller_id).await?;
        let resolved = self.gateway.resolve_module(&course, key).await?;
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(
            user_id = caller_id,
            course_id,
            module_id = %resolved.module.id,
            stage = %Stage::GenerateModule,
            "Stage started"
        );

        let draft = draft.unwrap_or_else(|| {
            json!({
                "title": resolved.module.title,
                "description": resolved.module.description,
                "objectives": resolved.module.objectives,
            })
        });
        let prompt = prompts::generate_module(
            &profile,
            &course.title,
            &draft,
            resolved.position,
            resolved.sibling_count,
        );
        let generated: GeneratedModule = self.run_stage(prompt).await?;
        self.gateway
            .replace_module_content(&resolved.module, generated)
            .await
    }

    /// Regenerates a module's lessons. The quiz is left as it is.
    pub async fn generate_lessons(
        &self,
        caller_id: &str,
        module_id: &str,
    ) -> Result<LessonBatchView, AppError> {
        let (module, course) = self.gateway.owned_module(module_id, caller_id).await?;
        let existing = self.gateway.list_lessons(&module.id).await?;
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(
            user_id = caller_id,
            module_id,
            stage = %Stage::GenerateLessons,
            "Stage started"
        );

        let batch: LessonBatch = self
            .run_stage(prompts::generate_lessons(
                &profile,
                &course.title,
                &module,
                &existing,
            ))
            .await?;
        let lessons = self.gateway.replace_lessons(&module.id, batch.lessons).await?;
        Ok(LessonBatchView {
            module_id: module.id,
            lessons: lessons.iter().map(LessonView::from).collect(),
        })
    }

    pub async fn generate_summary(
        &self,
        caller_id: &str,
        course_id: &str,
    ) -> Result<CourseSummary, AppError> {
        let course = self.gateway.owned_course(course_id, caller_id).await?;
        let modules = self.gateway.list_modules(&course.id).await?;
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(
            user_id = caller_id,
            course_id,
            stage = %Stage::GenerateSummary,
            "Stage started"
        );

        let summary: CourseSummary = self
            .run_stage(prompts::generate_summary(&profile, &course, &modules))
            .await?;
        self.gateway.update_summary(&course.id, &summary).await?;
        Ok(summary)
    }

    /// Rewrites a lesson's title and content in place.
    pub async fn develop_lesson(
        &self,
        caller_id: &str,
        lesson_id: &str,
    ) -> Result<LessonDetail, AppError> {
        let (lesson, module) = self.gateway.owned_lesson(lesson_id, caller_id).await?;
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(user_id = caller_id, lesson_id, stage = %Stage::DevelopLesson, "Stage started");

        let rewrite: LessonRewrite = self
            .run_stage(prompts::develop_lesson(&profile, &module.title, &lesson))
            .await?;
        let updated = LessonRow {
            title: rewrite.title,
            content: rewrite.content,
            ..lesson
        };
        self.gateway.update_lesson(&updated).await?;
        Ok(LessonDetail::new(&updated, &module))
    }

    /// Appends newly generated material to a lesson. The title is kept.
    pub async fn continue_lesson(
        &self,
        caller_id: &str,
        lesson_id: &str,
    ) -> Result<LessonDetail, AppError> {
        let (lesson, module) = self.gateway.owned_lesson(lesson_id, caller_id).await?;
        let profile = self.gateway.latest_profile(caller_id).await?;
        info!(user_id = caller_id, lesson_id, stage = %Stage::ContinueLesson, "Stage started");

        let rewrite: LessonRewrite = self
            .run_stage(prompts::continue_lesson(&profile, &module.title, &lesson))
            .await?;
        let content = format!("{}\n\n{}", lesson.content.trim_end(), rewrite.content.trim());
        let updated = LessonRow { content, ..lesson };
        self.gateway.update_lesson(&updated).await?;
        Ok(LessonDetail::new(&updated, &module))
    }
}
