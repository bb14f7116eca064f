//! Course materials, assignments and submissions repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::coursework::{
        Assignment, AssignmentRequest, CourseMaterial, NewCourseMaterial, Submission,
        SubmissionDetails,
    },
};

#[derive(Clone)]
pub struct CourseworkRepository {
    pool: Pool<Postgres>,
}

impl CourseworkRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------------
    // Materials
    // -----------------------------------------------------------------------

    pub async fn list_materials(&self, course_id: i32) -> AppResult<Vec<CourseMaterial>> {
        let rows = sqlx::query_as::<_, CourseMaterial>(
            "SELECT * FROM course_materials WHERE course_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_material(&self, id: i32) -> AppResult<CourseMaterial> {
        sqlx::query_as::<_, CourseMaterial>("SELECT * FROM course_materials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }

    pub async fn create_material(&self, data: &NewCourseMaterial) -> AppResult<CourseMaterial> {
        let row = sqlx::query_as::<_, CourseMaterial>(
            r#"
            INSERT INTO course_materials (
                course_id, title, description, file_path, original_filename,
                content_type, size_bytes, uploaded_by, uploaded_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.course_id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(&data.file_path)
        .bind(&data.original_filename)
        .bind(&data.content_type)
        .bind(data.size_bytes)
        .bind(data.uploaded_by)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Delete a material row, returning it so the stored file can be removed
    pub async fn delete_material(&self, id: i32) -> AppResult<CourseMaterial> {
        sqlx::query_as::<_, CourseMaterial>("DELETE FROM course_materials WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Material {} not found", id)))
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    pub async fn list_assignments(&self, course_id: i32) -> AppResult<Vec<Assignment>> {
        let rows = sqlx::query_as::<_, Assignment>(
            "SELECT * FROM assignments WHERE course_id = $1 ORDER BY due_date",
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_assignment(&self, id: i32) -> AppResult<Assignment> {
        sqlx::query_as::<_, Assignment>("SELECT * FROM assignments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
    }

    pub async fn create_assignment(
        &self,
        course_id: i32,
        data: &AssignmentRequest,
    ) -> AppResult<Assignment> {
        let row = sqlx::query_as::<_, Assignment>(
            r#"
            INSERT INTO assignments (course_id, title, description, due_date, max_score, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(course_id)
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(data.due_date)
        .bind(data.max_score)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_assignment(&self, id: i32, data: &AssignmentRequest) -> AppResult<Assignment> {
        sqlx::query_as::<_, Assignment>(
            r#"
            UPDATE assignments
            SET title = $2, description = $3, due_date = $4, max_score = $5
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(data.due_date)
        .bind(data.max_score)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
    }

    pub async fn delete_assignment(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM assignments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Assignment {} not found", id)));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Submissions
    // -----------------------------------------------------------------------

    /// Insert or replace a student's submission; replacing clears any grade
    pub async fn upsert_submission(
        &self,
        assignment_id: i32,
        student_id: i32,
        content: &str,
    ) -> AppResult<Submission> {
        let row = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions (assignment_id, student_id, content, submitted_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (assignment_id, student_id) DO UPDATE SET
                content      = EXCLUDED.content,
                submitted_at = EXCLUDED.submitted_at,
                score        = NULL,
                feedback     = NULL,
                graded_at    = NULL
            RETURNING *
            "#,
        )
        .bind(assignment_id)
        .bind(student_id)
        .bind(content)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_submission(&self, id: i32) -> AppResult<Submission> {
        sqlx::query_as::<_, Submission>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }

    pub async fn list_submissions(&self, assignment_id: i32) -> AppResult<Vec<SubmissionDetails>> {
        let rows = sqlx::query_as::<_, SubmissionDetails>(
            r#"
            SELECT s.id, s.assignment_id, s.student_id, u.username AS student_username,
                   s.content, s.submitted_at, (s.submitted_at > a.due_date) AS is_late,
                   s.score, s.feedback, s.graded_at
            FROM submissions s
            JOIN assignments a ON a.id = s.assignment_id
            JOIN users u ON u.id = s.student_id
            WHERE s.assignment_id = $1
            ORDER BY s.submitted_at
            "#,
        )
        .bind(assignment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn grade_submission(
        &self,
        id: i32,
        score: i32,
        feedback: Option<&str>,
    ) -> AppResult<Submission> {
        sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions SET score = $2, feedback = $3, graded_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(score)
        .bind(feedback)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Submission {} not found", id)))
    }
}
