//! Ownership-scoped persistence gateway.
//!
//! Turns validated stage outputs into rows and rows back into API views. Every
//! caller-facing read walks the ownership chain (lesson → module → course → user):
//! a missing link is `NotFound`, a foreign owner is `Forbidden`.
//!
//! The gateway is the only place identifiers and `orderIndex` values are minted.

use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::courses::views::{
    CourseAggregate, CourseListItem, LessonDetail, ModuleDetail, ModuleSummary,
};
use crate::errors::AppError;
use crate::generation::contract::{CourseSummary, GeneratedModule, LessonDraft, ModuleDraft};
use crate::models::course::{CourseRow, LessonRow, ModuleRow, QuizItemRow};
use crate::models::profile::{Profile, ProfileInput, ProfileRow};
use crate::store::CourseStore;

/// Addresses a module within a course: by current position or by id.
/// Negative positions are accepted here and resolve to not-found.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ModuleKey {
    Index(i64),
    Id(String),
}

/// A module resolved within its course, with its position among its siblings.
#[derive(Debug, Clone)]
pub struct ResolvedModule {
    pub module: ModuleRow,
    pub position: usize,
    pub sibling_count: usize,
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn forbidden() -> AppError {
    AppError::Forbidden("Access denied".to_string())
}

fn position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

#[derive(Clone)]
pub struct CourseGateway {
    store: Arc<dyn CourseStore>,
}

impl CourseGateway {
    pub fn new(store: Arc<dyn CourseStore>) -> Self {
        Self { store }
    }

    // ── Profiles ────────────────────────────────────────────────────────────

    pub async fn save_profile(&self, user_id: &str, input: ProfileInput) -> Result<Profile, AppError> {
        let tools_used = input
            .tools_used
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(anyhow::Error::from)?;
        let details = serde_json::to_value(&input.details).map_err(anyhow::Error::from)?;

        let row = ProfileRow {
            id: new_id(),
            user_id: user_id.to_string(),
            job: input.job.trim().to_string(),
            sector: input.sector.trim().to_string(),
            ai_level: input.ai_level.trim().to_string(),
            tools_used,
            work_style: input.work_style,
            details,
            created_at: Utc::now(),
        };
        self.store.insert_profile(&row).await?;
        Ok(row.into_domain())
    }

    /// The profile every stage runs against.
    pub async fn latest_profile(&self, user_id: &str) -> Result<Profile, AppError> {
        self.store
            .latest_profile(user_id)
            .await?
            .map(ProfileRow::into_domain)
            .ok_or_else(|| AppError::not_found("Profile", user_id))
    }

    // ── Writes ──────────────────────────────────────────────────────────────

    /// Creates a course owned by `owner` with one module per draft, positioned 0..n-1.
    pub async fn create_course(
        &self,
        owner: &str,
        title: &str,
        raw_ai_tools: &[Value],
        raw_best_practices: &[Value],
        drafts: &[ModuleDraft],
    ) -> Result<(CourseRow, Vec<ModuleRow>), AppError> {
        let now = Utc::now();
        let course = CourseRow {
            id: new_id(),
            user_id: owner.to_string(),
            title: title.to_string(),
            raw_ai_tools: Value::from(raw_ai_tools.to_vec()),
            raw_best_practices: Value::from(raw_best_practices.to_vec()),
            summary: None,
            certificate_text: None,
            skills_gained: None,
            created_at: now,
        };
        let modules: Vec<ModuleRow> = drafts
            .iter()
            .enumerate()
            .map(|(i, draft)| ModuleRow {
                id: new_id(),
                course_id: course.id.clone(),
                title: draft.title.clone(),
                order_index: position(i),
                description: draft.description.clone(),
                objectives: draft.objectives.clone(),
                chatbot_context: None,
                created_at: now,
            })
            .collect();

        self.store.insert_course_outline(&course, &modules).await?;
        Ok((course, modules))
    }

    /// Replaces the module's lessons and quiz with freshly generated ones.
    pub async fn replace_module_content(
        &self,
        module: &ModuleRow,
        generated: GeneratedModule,
    ) -> Result<ModuleDetail, AppError> {
        let now = Utc::now();
        let updated = ModuleRow {
            title: generated.title,
            chatbot_context: Some(generated.chatbot_context),
            ..module.clone()
        };
        let lessons = lesson_rows(&module.id, generated.lessons);
        let quiz: Vec<QuizItemRow> = generated
            .quiz
            .into_iter()
            .enumerate()
            .map(|(i, item)| QuizItemRow {
                id: new_id(),
                module_id: module.id.clone(),
                position: position(i),
                question: item.question,
                answer_data: Value::Object(item.answer_data),
                created_at: now,
            })
            .collect();

        self.store
            .replace_module_content(&updated, &lessons, &quiz)
            .await?;
        Ok(ModuleDetail::new(&updated, &lessons, &quiz))
    }

    /// Replaces the module's lessons, leaving its quiz in place.
    pub async fn replace_lessons(
        &self,
        module_id: &str,
        drafts: Vec<LessonDraft>,
    ) -> Result<Vec<LessonRow>, AppError> {
        let lessons = lesson_rows(module_id, drafts);
        self.store.replace_module_lessons(module_id, &lessons).await?;
        Ok(lessons)
    }

    pub async fn update_summary(&self, course_id: &str, summary: &CourseSummary) -> Result<(), AppError> {
        let skills = Value::from(summary.skills_gained.clone());
        self.store
            .update_course_summary(course_id, &summary.summary, &skills, &summary.certificate_text)
            .await
    }

    pub async fn update_lesson(&self, lesson: &LessonRow) -> Result<(), AppError> {
        self.store.update_lesson(lesson).await
    }

    // ── Ownership-checked lookups ──────────────────────────────────────────

    pub async fn owned_course(&self, course_id: &str, caller_id: &str) -> Result<CourseRow, AppError> {
        let course = self
            .store
            .get_course(course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Course", course_id))?;
        if course.user_id != caller_id {
            return Err(forbidden());
        }
        Ok(course)
    }

    pub async fn owned_module(
        &self,
        module_id: &str,
        caller_id: &str,
    ) -> Result<(ModuleRow, CourseRow), AppError> {
        let module = self
            .store
            .get_module(module_id)
            .await?
            .ok_or_else(|| AppError::not_found("Module", module_id))?;
        let course = self
            .store
            .get_course(&module.course_id)
            .await?
            .ok_or_else(|| AppError::not_found("Module", module_id))?;
        if course.user_id != caller_id {
            return Err(forbidden());
        }
        Ok((module, course))
    }

    pub async fn owned_lesson(
        &self,
        lesson_id: &str,
        caller_id: &str,
    ) -> Result<(LessonRow, ModuleRow), AppError> {
        let lesson = self
            .store
            .get_lesson(lesson_id)
            .await?
            .ok_or_else(|| AppError::not_found("Lesson", lesson_id))?;
        let (module, _) = self
            .owned_module(&lesson.module_id, caller_id)
            .await
            .map_err(|e| match e {
                AppError::NotFound(_) => AppError::not_found("Lesson", lesson_id),
                other => other,
            })?;
        Ok((lesson, module))
    }

    /// Resolves `key` against the course's current module list.
    pub async fn resolve_module(
        &self,
        course: &CourseRow,
        key: &ModuleKey,
    ) -> Result<ResolvedModule, AppError> {
        let modules = self.store.list_modules(&course.id).await?;
        let sibling_count = modules.len();
        let found = match key {
            ModuleKey::Index(index) => usize::try_from(*index)
                .ok()
                .and_then(|i| modules.get(i).map(|m| (i, m))),
            ModuleKey::Id(id) => modules.iter().enumerate().find(|(_, m)| &m.id == id),
        };
        let (position, module) = found.ok_or_else(|| {
            let key = match key {
                ModuleKey::Index(index) => format!("index {index} in course {}", course.id),
                ModuleKey::Id(id) => id.clone(),
            };
            AppError::not_found("Module", &key)
        })?;
        Ok(ResolvedModule {
            module: module.clone(),
            position,
            sibling_count,
        })
    }

    pub async fn list_modules(&self, course_id: &str) -> Result<Vec<ModuleRow>, AppError> {
        self.store.list_modules(course_id).await
    }

    pub async fn list_lessons(&self, module_id: &str) -> Result<Vec<LessonRow>, AppError> {
        self.store.list_lessons(module_id).await
    }

    // ── Read views ──────────────────────────────────────────────────────────

    pub async fn get_aggregate(&self, course_id: &str, caller_id: &str) -> Result<CourseAggregate, AppError> {
        let course = self.owned_course(course_id, caller_id).await?;
        let mut modules = Vec::new();
        for module in self.store.list_modules(&course.id).await? {
            let lessons = self.store.list_lessons(&module.id).await?;
            modules.push(ModuleSummary::new(&module, &lessons));
        }
        Ok(CourseAggregate::new(course, modules))
    }

    pub async fn get_module_detail(&self, module_id: &str, caller_id: &str) -> Result<ModuleDetail, AppError> {
        let (module, _) = self.owned_module(module_id, caller_id).await?;
        let lessons = self.store.list_lessons(&module.id).await?;
        let quiz = self.store.list_quiz_items(&module.id).await?;
        Ok(ModuleDetail::new(&module, &lessons, &quiz))
    }

    pub async fn get_lesson_detail(&self, lesson_id: &str, caller_id: &str) -> Result<LessonDetail, AppError> {
        let (lesson, module) = self.owned_lesson(lesson_id, caller_id).await?;
        Ok(LessonDetail::new(&lesson, &module))
    }

    /// Courses owned by `user_id`, newest first. The caller must already be `user_id`.
    pub async fn get_by_user(&self, user_id: &str) -> Result<Vec<CourseListItem>, AppError> {
        Ok(self
            .store
            .list_courses_by_user(user_id)
            .await?
            .into_iter()
            .map(CourseListItem::from)
            .collect())
    }
}

fn lesson_rows(module_id: &str, drafts: Vec<LessonDraft>) -> Vec<LessonRow> {
    let now = Utc::now();
    drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| LessonRow {
            id: new_id(),
            module_id: module_id.to_string(),
            title: draft.title,
            content: draft.content,
            order_index: position(i),
            created_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCourseStore;
    use crate::testing::generated_module;
    use serde_json::json;

    fn gateway() -> CourseGateway {
        CourseGateway::new(Arc::new(MemoryCourseStore::new()))
    }

    fn drafts(n: usize) -> Vec<ModuleDraft> {
        (0..n)
            .map(|i| ModuleDraft {
                title: format!("Module {i}"),
                description: None,
                objectives: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_create_course_assigns_contiguous_order() {
        let gw = gateway();
        let (course, modules) = gw
            .create_course("alice", "Course", &[json!("ChatGPT")], &[], &drafts(4))
            .await
            .unwrap();
        let order: Vec<i32> = gw
            .list_modules(&course.id)
            .await
            .unwrap()
            .iter()
            .map(|m| m.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
        assert_eq!(modules.len(), 4);
    }

    #[tokio::test]
    async fn test_ownership_two_tier_check() {
        let gw = gateway();
        let (course, modules) = gw
            .create_course("alice", "Course", &[], &[], &drafts(1))
            .await
            .unwrap();

        assert!(gw.owned_course(&course.id, "alice").await.is_ok());
        assert!(matches!(
            gw.owned_course(&course.id, "bob").await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            gw.owned_course("missing", "alice").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            gw.get_module_detail(&modules[0].id, "bob").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_module_names_id() {
        let err = gateway()
            .get_module_detail("non-existent-id", "alice")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("non-existent-id"));
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_lesson_access_walks_chain() {
        let gw = gateway();
        let (_, modules) = gw
            .create_course("alice", "Course", &[], &[], &drafts(1))
            .await
            .unwrap();
        let detail = gw
            .replace_module_content(&modules[0], generated_module("Intro", 2, 1))
            .await
            .unwrap();
        let lesson_id = &detail.lessons[1].id;

        let lesson = gw.get_lesson_detail(lesson_id, "alice").await.unwrap();
        assert_eq!(lesson.order_index, 1);
        assert_eq!(lesson.module.id, modules[0].id);
        assert!(matches!(
            gw.get_lesson_detail(lesson_id, "bob").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_resolve_module_by_index_and_id() {
        let gw = gateway();
        let (course, modules) = gw
            .create_course("alice", "Course", &[], &[], &drafts(3))
            .await
            .unwrap();

        let by_index = gw.resolve_module(&course, &ModuleKey::Index(2)).await.unwrap();
        assert_eq!(by_index.module.id, modules[2].id);
        assert_eq!(by_index.position, 2);
        assert_eq!(by_index.sibling_count, 3);

        let by_id = gw
            .resolve_module(&course, &ModuleKey::Id(modules[1].id.clone()))
            .await
            .unwrap();
        assert_eq!(by_id.position, 1);

        assert!(matches!(
            gw.resolve_module(&course, &ModuleKey::Index(3)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            gw.resolve_module(&course, &ModuleKey::Index(-1)).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            gw.resolve_module(&course, &ModuleKey::Id("elsewhere".into())).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_module_key_deserializes_number_or_string() {
        let index: ModuleKey = serde_json::from_value(json!(0)).unwrap();
        let id: ModuleKey = serde_json::from_value(json!("abc")).unwrap();
        assert_eq!(index, ModuleKey::Index(0));
        assert_eq!(id, ModuleKey::Id("abc".to_string()));

        let negative: ModuleKey = serde_json::from_value(json!(-1)).unwrap();
        assert_eq!(negative, ModuleKey::Index(-1));
    }

    #[tokio::test]
    async fn test_latest_profile_missing_is_not_found() {
        let err = gateway().latest_profile("nobody").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
