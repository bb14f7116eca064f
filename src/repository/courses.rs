//! Courses and enrollments repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{is_unique_violation, AppError, AppResult},
    models::{
        course::{
            Course, CourseQuery, CourseRequest, CourseSummary, Enrollment, EnrollmentDetails,
            GradeEntry,
        },
        PageWindow,
    },
};

const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.code, c.title, c.description, c.credits,
           c.department_id, d.name AS department_name,
           c.instructor_id, u.username AS instructor_username,
           (SELECT COUNT(*) FROM enrollments e WHERE e.course_id = c.id) AS enrollment_count
    FROM courses c
    LEFT JOIN departments d ON d.id = c.department_id
    LEFT JOIN users u ON u.id = c.instructor_id
"#;

const ENROLLMENT_SELECT: &str = r#"
    SELECT e.id, e.student_id, u.username AS student_username,
           u.first_name AS student_first_name, u.last_name AS student_last_name,
           e.course_id, c.code AS course_code, c.title AS course_title,
           e.enrollment_date, e.grade
    FROM enrollments e
    JOIN users u ON u.id = e.student_id
    JOIN courses c ON c.id = e.course_id
"#;

#[derive(Clone)]
pub struct CoursesRepository {
    pool: Pool<Postgres>,
}

impl CoursesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List courses with optional filters and pagination, ordered by code
    pub async fn list(&self, query: &CourseQuery) -> AppResult<(Vec<CourseSummary>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.title.is_some() {
            conditions.push(format!("c.title ILIKE ${}", idx));
            idx += 1;
        }
        if query.code.is_some() {
            conditions.push(format!("c.code ILIKE ${}", idx));
            idx += 1;
        }
        if query.department_id.is_some() {
            conditions.push(format!("c.department_id = ${}", idx));
            idx += 1;
        }
        if query.instructor_id.is_some() {
            conditions.push(format!("c.instructor_id = ${}", idx));
            idx += 1;
        }
        if query.credits.is_some() {
            conditions.push(format!("c.credits = ${}", idx));
            idx += 1;
        }
        if query.credits_min.is_some() {
            conditions.push(format!("c.credits >= ${}", idx));
            idx += 1;
        }
        if query.credits_max.is_some() {
            conditions.push(format!("c.credits <= ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let title = query.title.as_ref().map(|t| format!("%{}%", t.trim()));
        let code = query.code.as_ref().map(|c| format!("%{}%", c.trim()));

        macro_rules! bind_filters {
            ($builder:ident) => {
                if let Some(ref t) = title { $builder = $builder.bind(t); }
                if let Some(ref c) = code { $builder = $builder.bind(c); }
                if let Some(d) = query.department_id { $builder = $builder.bind(d); }
                if let Some(i) = query.instructor_id { $builder = $builder.bind(i); }
                if let Some(cr) = query.credits { $builder = $builder.bind(cr); }
                if let Some(min) = query.credits_min { $builder = $builder.bind(min); }
                if let Some(max) = query.credits_max { $builder = $builder.bind(max); }
            };
        }

        let count_q = format!("SELECT COUNT(*) FROM courses c {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        bind_filters!(count_builder);
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "{} {} ORDER BY c.code LIMIT {} OFFSET {}",
            SUMMARY_SELECT,
            where_clause,
            window.per_page,
            window.offset()
        );
        let mut builder = sqlx::query_as::<_, CourseSummary>(&select_q);
        bind_filters!(builder);

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Course> {
        sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", id)))
    }

    /// Course with department/instructor names and enrollment count
    pub async fn get_summary(&self, id: i32) -> AppResult<CourseSummary> {
        let q = format!("{} WHERE c.id = $1", SUMMARY_SELECT);
        sqlx::query_as::<_, CourseSummary>(&q)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Course {} not found", id)))
    }

    /// Courses taught by an instructor
    pub async fn list_by_instructor(&self, instructor_id: i32) -> AppResult<Vec<CourseSummary>> {
        let q = format!("{} WHERE c.instructor_id = $1 ORDER BY c.code", SUMMARY_SELECT);
        let rows = sqlx::query_as::<_, CourseSummary>(&q)
            .bind(instructor_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn create(&self, data: &CourseRequest, instructor_id: i32) -> AppResult<Course> {
        let row = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (code, title, description, credits, department_id, instructor_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.code.trim())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(data.credits)
        .bind(data.department_id)
        .bind(instructor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Replace course fields; the instructor is kept
    pub async fn update(&self, id: i32, data: &CourseRequest) -> AppResult<Course> {
        sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET code = $2, title = $3, description = $4, credits = $5, department_id = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.code.trim())
        .bind(data.title.trim())
        .bind(&data.description)
        .bind(data.credits)
        .bind(data.department_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Course {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM courses WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Course {} not found", id)));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Enrollments
    // -----------------------------------------------------------------------

    /// Enroll a student; a second enrollment in the same course is a conflict
    pub async fn enroll(&self, student_id: i32, course_id: i32) -> AppResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>(
            r#"
            INSERT INTO enrollments (student_id, course_id, enrollment_date)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(student_id)
        .bind(course_id)
        .bind(Utc::now().date_naive())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Already enrolled in this course".to_string())
            } else {
                AppError::Database(e)
            }
        })
    }

    pub async fn get_enrollment(&self, id: i32) -> AppResult<Enrollment> {
        sqlx::query_as::<_, Enrollment>("SELECT * FROM enrollments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", id)))
    }

    pub async fn delete_enrollment(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM enrollments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Enrollment {} not found", id)));
        }
        Ok(())
    }

    pub async fn is_enrolled(&self, student_id: i32, course_id: i32) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM enrollments WHERE student_id = $1 AND course_id = $2)",
        )
        .bind(student_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Course roster ordered by student name
    pub async fn roster(&self, course_id: i32) -> AppResult<Vec<EnrollmentDetails>> {
        let q = format!(
            "{} WHERE e.course_id = $1 ORDER BY u.last_name, u.first_name, u.username",
            ENROLLMENT_SELECT
        );
        let rows = sqlx::query_as::<_, EnrollmentDetails>(&q)
            .bind(course_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Enrollments of a student ordered by course code
    pub async fn list_for_student(&self, student_id: i32) -> AppResult<Vec<EnrollmentDetails>> {
        let q = format!("{} WHERE e.student_id = $1 ORDER BY c.code", ENROLLMENT_SELECT);
        let rows = sqlx::query_as::<_, EnrollmentDetails>(&q)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Set grades for enrollments of one course, all or nothing
    pub async fn set_grades(&self, course_id: i32, grades: &[GradeEntry]) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        for entry in grades {
            let result = sqlx::query(
                "UPDATE enrollments SET grade = $1 WHERE id = $2 AND course_id = $3",
            )
            .bind(&entry.grade)
            .bind(entry.enrollment_id)
            .bind(course_id)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "Enrollment {} not found in course {}",
                    entry.enrollment_id, course_id
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
