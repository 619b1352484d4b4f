//! PostgreSQL adapter for `CourseStore`. Schema: `migrations/0001_init.sql`.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

use crate::errors::AppError;
use crate::models::course::{CourseListRow, CourseRow, LessonRow, ModuleRow, QuizItemRow};
use crate::models::profile::ProfileRow;
use crate::store::{CourseStore, StoreResult};

#[derive(Clone)]
pub struct PgCourseStore {
    pool: PgPool,
}

impl PgCourseStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool against `database_url`.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to PostgreSQL...");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;
        info!("PostgreSQL connection pool established");
        Ok(Self::new(pool))
    }
}

const INSERT_LESSON: &str = r#"
    INSERT INTO lessons (id, module_id, title, content, order_index, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

#[async_trait]
impl CourseStore for PgCourseStore {
    async fn insert_profile(&self, profile: &ProfileRow) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles
                (id, user_id, job, sector, ai_level, tools_used, work_style, details, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&profile.id)
        .bind(&profile.user_id)
        .bind(&profile.job)
        .bind(&profile.sector)
        .bind(&profile.ai_level)
        .bind(&profile.tools_used)
        .bind(&profile.work_style)
        .bind(&profile.details)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn latest_profile(&self, user_id: &str) -> StoreResult<Option<ProfileRow>> {
        Ok(sqlx::query_as::<_, ProfileRow>(
            "SELECT * FROM profiles WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_course_outline(
        &self,
        course: &CourseRow,
        modules: &[ModuleRow],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO courses
                (id, user_id, title, raw_ai_tools, raw_best_practices,
                 summary, certificate_text, skills_gained, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&course.id)
        .bind(&course.user_id)
        .bind(&course.title)
        .bind(&course.raw_ai_tools)
        .bind(&course.raw_best_practices)
        .bind(&course.summary)
        .bind(&course.certificate_text)
        .bind(&course.skills_gained)
        .bind(course.created_at)
        .execute(&mut *tx)
        .await?;

        for module in modules {
            sqlx::query(
                r#"
                INSERT INTO modules
                    (id, course_id, title, order_index, description, objectives,
                     chatbot_context, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(&module.id)
            .bind(&module.course_id)
            .bind(&module.title)
            .bind(module.order_index)
            .bind(&module.description)
            .bind(&module.objectives)
            .bind(&module.chatbot_context)
            .bind(module.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_course(&self, course_id: &str) -> StoreResult<Option<CourseRow>> {
        Ok(
            sqlx::query_as::<_, CourseRow>("SELECT * FROM courses WHERE id = $1")
                .bind(course_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_courses_by_user(&self, user_id: &str) -> StoreResult<Vec<CourseListRow>> {
        Ok(sqlx::query_as::<_, CourseListRow>(
            r#"
            SELECT c.id, c.title, c.created_at, COUNT(m.id) AS modules_count
            FROM courses c
            LEFT JOIN modules m ON m.course_id = c.id
            WHERE c.user_id = $1
            GROUP BY c.id, c.title, c.created_at
            ORDER BY c.created_at DESC, c.id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_course_summary(
        &self,
        course_id: &str,
        summary: &str,
        skills_gained: &Value,
        certificate_text: &str,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE courses SET summary = $1, skills_gained = $2, certificate_text = $3 WHERE id = $4",
        )
        .bind(summary)
        .bind(skills_gained)
        .bind(certificate_text)
        .bind(course_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Course", course_id));
        }
        Ok(())
    }

    async fn get_module(&self, module_id: &str) -> StoreResult<Option<ModuleRow>> {
        Ok(
            sqlx::query_as::<_, ModuleRow>("SELECT * FROM modules WHERE id = $1")
                .bind(module_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_modules(&self, course_id: &str) -> StoreResult<Vec<ModuleRow>> {
        Ok(sqlx::query_as::<_, ModuleRow>(
            "SELECT * FROM modules WHERE course_id = $1 ORDER BY order_index ASC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn replace_module_content(
        &self,
        module: &ModuleRow,
        lessons: &[LessonRow],
        quiz: &[QuizItemRow],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE modules SET title = $1, chatbot_context = $2 WHERE id = $3")
            .bind(&module.title)
            .bind(&module.chatbot_context)
            .bind(&module.id)
            .execute(&mut *tx)
            .await?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found("Module", &module.id));
        }

        sqlx::query("DELETE FROM lessons WHERE module_id = $1")
            .bind(&module.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM quiz_items WHERE module_id = $1")
            .bind(&module.id)
            .execute(&mut *tx)
            .await?;

        for lesson in lessons {
            sqlx::query(INSERT_LESSON)
                .bind(&lesson.id)
                .bind(&lesson.module_id)
                .bind(&lesson.title)
                .bind(&lesson.content)
                .bind(lesson.order_index)
                .bind(lesson.created_at)
                .execute(&mut *tx)
                .await?;
        }

        for item in quiz {
            sqlx::query(
                r#"
                INSERT INTO quiz_items (id, module_id, position, question, answer_data, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.module_id)
            .bind(item.position)
            .bind(&item.question)
            .bind(&item.answer_data)
            .bind(item.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn replace_module_lessons(
        &self,
        module_id: &str,
        lessons: &[LessonRow],
    ) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM lessons WHERE module_id = $1")
            .bind(module_id)
            .execute(&mut *tx)
            .await?;

        for lesson in lessons {
            sqlx::query(INSERT_LESSON)
                .bind(&lesson.id)
                .bind(&lesson.module_id)
                .bind(&lesson.title)
                .bind(&lesson.content)
                .bind(lesson.order_index)
                .bind(lesson.created_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get_lesson(&self, lesson_id: &str) -> StoreResult<Option<LessonRow>> {
        Ok(
            sqlx::query_as::<_, LessonRow>("SELECT * FROM lessons WHERE id = $1")
                .bind(lesson_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_lessons(&self, module_id: &str) -> StoreResult<Vec<LessonRow>> {
        Ok(sqlx::query_as::<_, LessonRow>(
            "SELECT * FROM lessons WHERE module_id = $1 ORDER BY order_index ASC",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn update_lesson(&self, lesson: &LessonRow) -> StoreResult<()> {
        let result = sqlx::query("UPDATE lessons SET title = $1, content = $2 WHERE id = $3")
            .bind(&lesson.title)
            .bind(&lesson.content)
            .bind(&lesson.id)
            .execute(&self.pool)
            .await?;
        // Zero rows: the module's lessons were replaced while this lesson was being generated.
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Lesson", &lesson.id));
        }
        Ok(())
    }

    async fn list_quiz_items(&self, module_id: &str) -> StoreResult<Vec<QuizItemRow>> {
        Ok(sqlx::query_as::<_, QuizItemRow>(
            "SELECT * FROM quiz_items WHERE module_id = $1 ORDER BY position ASC",
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?)
    }
}
