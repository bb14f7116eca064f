//! Users and profiles repository

use chrono::Utc;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        course::ClassStudent,
        department::{EmployeeProfile, EmployeeProfileRequest, StudentProfile, StudentProfileRequest},
        user::{CreateUser, Role, UpdateUser, User, UserQuery},
        PageWindow,
    },
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Get user by username (case-insensitive)
    pub async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT * FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check if a username is taken
    pub async fn username_exists(&self, username: &str, exclude_id: Option<i32>) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(username) = LOWER($1) AND ($2::int IS NULL OR id != $2)
            )
            "#,
        )
        .bind(username)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    /// Search users with pagination
    pub async fn search(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.q.is_some() {
            conditions.push(format!(
                "(LOWER(username) LIKE ${0} OR LOWER(first_name) LIKE ${0} OR LOWER(last_name) LIKE ${0})",
                idx
            ));
            idx += 1;
        }
        if query.role.is_some() {
            conditions.push(format!("role = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let pattern = query.q.as_ref().map(|q| format!("%{}%", q.trim().to_lowercase()));

        let count_q = format!("SELECT COUNT(*) FROM users {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref p) = pattern { count_builder = count_builder.bind(p); }
        if let Some(role) = query.role { count_builder = count_builder.bind(role); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM users {} ORDER BY username LIMIT {} OFFSET {}",
            where_clause,
            window.per_page,
            window.offset()
        );
        let mut builder = sqlx::query_as::<_, User>(&select_q);
        if let Some(ref p) = pattern { builder = builder.bind(p); }
        if let Some(role) = query.role { builder = builder.bind(role); }

        let users = builder.fetch_all(&self.pool).await?;
        Ok((users, total))
    }

    /// Create a new user; the staff/superuser flags follow the role
    pub async fn create(&self, user: &CreateUser, password_hash: &str) -> AppResult<User> {
        let role = user.role.unwrap_or_default();

        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (
                username, email, password, first_name, last_name, role,
                phone_number, date_of_birth, is_active, is_staff, is_superuser, date_joined
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(user.username.trim())
        .bind(user.email.trim())
        .bind(password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(role)
        .bind(&user.phone_number)
        .bind(user.date_of_birth)
        .bind(role.grants_staff_flag())
        .bind(role.grants_superuser_flag())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    /// Update a user. A role change re-derives the staff/superuser flags.
    pub async fn update(
        &self,
        id: i32,
        data: &UpdateUser,
        password_hash: Option<&str>,
    ) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET
                username      = COALESCE($2, username),
                email         = COALESCE($3, email),
                password      = COALESCE($4, password),
                first_name    = COALESCE($5, first_name),
                last_name     = COALESCE($6, last_name),
                role          = COALESCE($7, role),
                phone_number  = COALESCE($8, phone_number),
                date_of_birth = COALESCE($9, date_of_birth),
                is_active     = COALESCE($10, is_active),
                is_staff      = COALESCE($11, is_staff),
                is_superuser  = COALESCE($12, is_superuser)
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.username.as_deref().map(str::trim))
        .bind(data.email.as_deref().map(str::trim))
        .bind(password_hash)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(data.role)
        .bind(&data.phone_number)
        .bind(data.date_of_birth)
        .bind(data.is_active)
        .bind(data.role.map(|r| r.grants_staff_flag()))
        .bind(data.role.map(|r| r.grants_superuser_flag()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    /// Record a successful login
    pub async fn touch_last_login(&self, id: i32) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete a user
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User with id {} not found", id)));
        }
        Ok(())
    }

    /// Role of an existing user
    pub async fn get_role(&self, id: i32) -> AppResult<Role> {
        sqlx::query_scalar::<_, Role>("SELECT role FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    // -----------------------------------------------------------------------
    // Profiles
    // -----------------------------------------------------------------------

    pub async fn get_student_profile(&self, user_id: i32) -> AppResult<Option<StudentProfile>> {
        let profile = sqlx::query_as::<_, StudentProfile>(
            "SELECT * FROM student_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    pub async fn get_employee_profile(&self, user_id: i32) -> AppResult<Option<EmployeeProfile>> {
        let profile = sqlx::query_as::<_, EmployeeProfile>(
            "SELECT * FROM employee_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Create or replace the student profile of a user
    pub async fn upsert_student_profile(
        &self,
        user_id: i32,
        data: &StudentProfileRequest,
    ) -> AppResult<StudentProfile> {
        let profile = sqlx::query_as::<_, StudentProfile>(
            r#"
            INSERT INTO student_profiles (user_id, student_id_number, enrollment_date, assigned_class_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                student_id_number = EXCLUDED.student_id_number,
                enrollment_date   = EXCLUDED.enrollment_date,
                assigned_class_id = EXCLUDED.assigned_class_id
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(data.student_id_number.trim())
        .bind(data.enrollment_date)
        .bind(data.assigned_class_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Create or replace the employee profile of a user
    pub async fn upsert_employee_profile(
        &self,
        user_id: i32,
        data: &EmployeeProfileRequest,
    ) -> AppResult<EmployeeProfile> {
        let date_joined = data.date_joined.unwrap_or_else(|| Utc::now().date_naive());
        let profile = sqlx::query_as::<_, EmployeeProfile>(
            r#"
            INSERT INTO employee_profiles (user_id, employee_id_number, department_id, date_joined)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO UPDATE SET
                employee_id_number = EXCLUDED.employee_id_number,
                department_id      = EXCLUDED.department_id,
                date_joined        = EXCLUDED.date_joined
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(data.employee_id_number.trim())
        .bind(data.department_id)
        .bind(date_joined)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }

    /// Students assigned to a class, ordered by name
    pub async fn students_in_class(&self, class_id: i32) -> AppResult<Vec<ClassStudent>> {
        let rows = sqlx::query_as::<_, ClassStudent>(
            r#"
            SELECT u.id AS user_id, u.username, u.first_name, u.last_name, sp.student_id_number
            FROM student_profiles sp
            JOIN users u ON u.id = sp.user_id
            WHERE sp.assigned_class_id = $1
            ORDER BY u.last_name, u.first_name
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
