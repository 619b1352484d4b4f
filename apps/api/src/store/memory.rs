//! In-process `CourseStore`. Used when no `DATABASE_URL` is configured and by tests.
//! Every write method runs under a single write lock, matching the per-stage
//! atomicity of the PostgreSQL adapter.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::course::{CourseListRow, CourseRow, LessonRow, ModuleRow, QuizItemRow};
use crate::models::profile::ProfileRow;
use crate::store::{CourseStore, StoreResult};

#[derive(Default)]
struct Tables {
    /// Insertion order doubles as recency for equal timestamps.
    profiles: Vec<ProfileRow>,
    courses: HashMap<String, CourseRow>,
    modules: HashMap<String, ModuleRow>,
    lessons: HashMap<String, LessonRow>,
    quiz_items: HashMap<String, QuizItemRow>,
}

#[derive(Default)]
pub struct MemoryCourseStore {
    tables: RwLock<Tables>,
}

impl MemoryCourseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// A row removed by a concurrent write between the caller's read and this write.
fn missing(kind: &str, id: &str) -> AppError {
    AppError::not_found(kind, id)
}

#[async_trait]
impl CourseStore for MemoryCourseStore {
    async fn insert_profile(&self, profile: &ProfileRow) -> StoreResult<()> {
        self.tables.write().await.profiles.push(profile.clone());
        Ok(())
    }

    async fn latest_profile(&self, user_id: &str) -> StoreResult<Option<ProfileRow>> {
        let tables = self.tables.read().await;
        // max_by_key keeps the last maximum, so the later insert wins a timestamp tie.
        Ok(tables
            .profiles
            .iter()
            .filter(|p| p.user_id == user_id)
            .max_by_key(|p| p.created_at)
            .cloned())
    }

    async fn insert_course_outline(
        &self,
        course: &CourseRow,
        modules: &[ModuleRow],
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.courses.insert(course.id.clone(), course.clone());
        for module in modules {
            tables.modules.insert(module.id.clone(), module.clone());
        }
        Ok(())
    }

    async fn get_course(&self, course_id: &str) -> StoreResult<Option<CourseRow>> {
        Ok(self.tables.read().await.courses.get(course_id).cloned())
    }

    async fn list_courses_by_user(&self, user_id: &str) -> StoreResult<Vec<CourseListRow>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<CourseListRow> = tables
            .courses
            .values()
            .filter(|c| c.user_id == user_id)
            .map(|c| CourseListRow {
                id: c.id.clone(),
                title: c.title.clone(),
                created_at: c.created_at,
                modules_count: tables
                    .modules
                    .values()
                    .filter(|m| m.course_id == c.id)
                    .count() as i64,
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rows)
    }

    async fn update_course_summary(
        &self,
        course_id: &str,
        summary: &str,
        skills_gained: &Value,
        certificate_text: &str,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let course = tables
            .courses
            .get_mut(course_id)
            .ok_or_else(|| missing("Course", course_id))?;
        course.summary = Some(summary.to_string());
        course.skills_gained = Some(skills_gained.clone());
        course.certificate_text = Some(certificate_text.to_string());
        Ok(())
    }

    async fn get_module(&self, module_id: &str) -> StoreResult<Option<ModuleRow>> {
        Ok(self.tables.read().await.modules.get(module_id).cloned())
    }

    async fn list_modules(&self, course_id: &str) -> StoreResult<Vec<ModuleRow>> {
        let tables = self.tables.read().await;
        let mut modules: Vec<ModuleRow> = tables
            .modules
            .values()
            .filter(|m| m.course_id == course_id)
            .cloned()
            .collect();
        modules.sort_by_key(|m| m.order_index);
        Ok(modules)
    }

    async fn replace_module_content(
        &self,
        module: &ModuleRow,
        lessons: &[LessonRow],
        quiz: &[QuizItemRow],
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .modules
            .get_mut(&module.id)
            .ok_or_else(|| missing("Module", &module.id))?;
        stored.title = module.title.clone();
        stored.chatbot_context = module.chatbot_context.clone();

        tables.lessons.retain(|_, l| l.module_id != module.id);
        tables.quiz_items.retain(|_, q| q.module_id != module.id);
        for lesson in lessons {
            tables.lessons.insert(lesson.id.clone(), lesson.clone());
        }
        for item in quiz {
            tables.quiz_items.insert(item.id.clone(), item.clone());
        }
        Ok(())
    }

    async fn replace_module_lessons(
        &self,
        module_id: &str,
        lessons: &[LessonRow],
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        tables.lessons.retain(|_, l| l.module_id != module_id);
        for lesson in lessons {
            tables.lessons.insert(lesson.id.clone(), lesson.clone());
        }
        Ok(())
    }

    async fn get_lesson(&self, lesson_id: &str) -> StoreResult<Option<LessonRow>> {
        Ok(self.tables.read().await.lessons.get(lesson_id).cloned())
    }

    async fn list_lessons(&self, module_id: &str) -> StoreResult<Vec<LessonRow>> {
        let tables = self.tables.read().await;
        let mut lessons: Vec<LessonRow> = tables
            .lessons
            .values()
            .filter(|l| l.module_id == module_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.order_index);
        Ok(lessons)
    }

    async fn update_lesson(&self, lesson: &LessonRow) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .lessons
            .get_mut(&lesson.id)
            .ok_or_else(|| missing("Lesson", &lesson.id))?;
        stored.title = lesson.title.clone();
        stored.content = lesson.content.clone();
        Ok(())
    }

    async fn list_quiz_items(&self, module_id: &str) -> StoreResult<Vec<QuizItemRow>> {
        let tables = self.tables.read().await;
        let mut items: Vec<QuizItemRow> = tables
            .quiz_items
            .values()
            .filter(|q| q.module_id == module_id)
            .cloned()
            .collect();
        items.sort_by_key(|q| q.position);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn course(id: &str, user: &str, offset_secs: i64) -> CourseRow {
        CourseRow {
            id: id.to_string(),
            user_id: user.to_string(),
            title: format!("Course {id}"),
            raw_ai_tools: json!([]),
            raw_best_practices: json!([]),
            summary: None,
            certificate_text: None,
            skills_gained: None,
            created_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    fn module(id: &str, course_id: &str, order_index: i32) -> ModuleRow {
        ModuleRow {
            id: id.to_string(),
            course_id: course_id.to_string(),
            title: format!("Module {id}"),
            order_index,
            description: None,
            objectives: None,
            chatbot_context: None,
            created_at: Utc::now(),
        }
    }

    fn lesson(id: &str, module_id: &str, order_index: i32) -> LessonRow {
        LessonRow {
            id: id.to_string(),
            module_id: module_id.to_string(),
            title: format!("Lesson {id}"),
            content: "content".to_string(),
            order_index,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_list_courses_newest_first_with_counts() {
        let store = MemoryCourseStore::new();
        store
            .insert_course_outline(&course("old", "u1", -60), &[module("m1", "old", 0)])
            .await
            .unwrap();
        store
            .insert_course_outline(
                &course("new", "u1", 0),
                &[module("m2", "new", 0), module("m3", "new", 1)],
            )
            .await
            .unwrap();
        store
            .insert_course_outline(&course("other", "u2", 0), &[])
            .await
            .unwrap();

        let rows = store.list_courses_by_user("u1").await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(rows[0].modules_count, 2);
        assert_eq!(rows[1].modules_count, 1);
    }

    #[tokio::test]
    async fn test_modules_listed_by_order_index() {
        let store = MemoryCourseStore::new();
        store
            .insert_course_outline(
                &course("c", "u", 0),
                &[module("b", "c", 1), module("a", "c", 0), module("z", "c", 2)],
            )
            .await
            .unwrap();
        let order: Vec<i32> = store
            .list_modules("c")
            .await
            .unwrap()
            .iter()
            .map(|m| m.order_index)
            .collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_replace_module_lessons_keeps_other_modules() {
        let store = MemoryCourseStore::new();
        store
            .insert_course_outline(&course("c", "u", 0), &[module("m1", "c", 0), module("m2", "c", 1)])
            .await
            .unwrap();
        store
            .replace_module_lessons("m1", &[lesson("l1", "m1", 0), lesson("l2", "m1", 1)])
            .await
            .unwrap();
        store
            .replace_module_lessons("m2", &[lesson("l3", "m2", 0)])
            .await
            .unwrap();
        store
            .replace_module_lessons("m1", &[lesson("l4", "m1", 0)])
            .await
            .unwrap();

        let m1: Vec<String> = store.list_lessons("m1").await.unwrap().into_iter().map(|l| l.id).collect();
        let m2: Vec<String> = store.list_lessons("m2").await.unwrap().into_iter().map(|l| l.id).collect();
        assert_eq!(m1, vec!["l4"]);
        assert_eq!(m2, vec!["l3"]);
        assert!(store.get_lesson("l1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_of_replaced_lesson_is_not_found() {
        let store = MemoryCourseStore::new();
        store
            .insert_course_outline(&course("c", "u", 0), &[module("m1", "c", 0)])
            .await
            .unwrap();
        store
            .replace_module_lessons("m1", &[lesson("l1", "m1", 0)])
            .await
            .unwrap();
        let stale = store.get_lesson("l1").await.unwrap().unwrap();
        store
            .replace_module_lessons("m1", &[lesson("l2", "m1", 0)])
            .await
            .unwrap();

        let err = store.update_lesson(&stale).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg.contains("l1")));

        let err = store
            .update_course_summary("gone", "S", &json!([]), "C")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_latest_profile_prefers_later_insert() {
        let store = MemoryCourseStore::new();
        let now = Utc::now();
        for (id, job) in [("p1", "Analyst"), ("p2", "Manager")] {
            store
                .insert_profile(&ProfileRow {
                    id: id.to_string(),
                    user_id: "u".to_string(),
                    job: job.to_string(),
                    sector: "Tech".to_string(),
                    ai_level: "beginner".to_string(),
                    tools_used: None,
                    work_style: None,
                    details: json!({}),
                    created_at: now,
                })
                .await
                .unwrap();
        }
        let latest = store.latest_profile("u").await.unwrap().unwrap();
        assert_eq!(latest.id, "p2");
        assert!(store.latest_profile("nobody").await.unwrap().is_none());
    }
}
