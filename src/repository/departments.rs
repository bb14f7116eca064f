//! Departments and classes repository

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::{
        course::{Class, ClassRequest},
        department::{Department, DepartmentRequest},
    },
};

#[derive(Clone)]
pub struct DepartmentsRepository {
    pool: Pool<Postgres>,
}

impl DepartmentsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>("SELECT * FROM departments ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Department> {
        sqlx::query_as::<_, Department>("SELECT * FROM departments WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))
    }

    pub async fn create(&self, data: &DepartmentRequest) -> AppResult<Department> {
        let row = sqlx::query_as::<_, Department>(
            r#"
            INSERT INTO departments (name, description, head_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.head_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &DepartmentRequest) -> AppResult<Department> {
        sqlx::query_as::<_, Department>(
            r#"
            UPDATE departments SET name = $2, description = $3, head_id = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(&data.description)
        .bind(data.head_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Department {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM departments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Department {} not found", id)));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    pub async fn list_classes(&self) -> AppResult<Vec<Class>> {
        let rows = sqlx::query_as::<_, Class>(
            "SELECT * FROM classes ORDER BY academic_year DESC, name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_class(&self, id: i32) -> AppResult<Class> {
        sqlx::query_as::<_, Class>("SELECT * FROM classes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))
    }

    pub async fn create_class(&self, data: &ClassRequest) -> AppResult<Class> {
        let row = sqlx::query_as::<_, Class>(
            r#"
            INSERT INTO classes (name, academic_year, advisor_id)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.academic_year)
        .bind(data.advisor_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_class(&self, id: i32, data: &ClassRequest) -> AppResult<Class> {
        sqlx::query_as::<_, Class>(
            r#"
            UPDATE classes SET name = $2, academic_year = $3, advisor_id = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(&data.academic_year)
        .bind(data.advisor_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Class {} not found", id)))
    }

    pub async fn delete_class(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Class {} not found", id)));
        }
        Ok(())
    }
}
