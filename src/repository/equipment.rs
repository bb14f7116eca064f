//! Equipment, borrowing and repair repository
//!
//! Methods taking a `Transaction` are the building blocks of the availability
//! state machine; callers hold the equipment row lock for the whole
//! transition.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{
            BorrowingDetails, BorrowingRecord, CategoryRequest, Equipment, EquipmentCategory,
            EquipmentQuery, EquipmentRequest, EquipmentStatus,
        },
        repair::{RepairQuery, RepairRequest},
        PageWindow,
    },
};

const BORROWING_SELECT: &str = r#"
    SELECT b.id, b.equipment_id, e.name AS equipment_name, e.identifier AS equipment_identifier,
           b.borrower_id, u.username AS borrower_username,
           b.borrow_date, b.due_date, b.return_date, b.is_returned,
           (NOT b.is_returned AND b.due_date < NOW()) AS is_overdue
    FROM borrowing_records b
    JOIN equipment e ON e.id = b.equipment_id
    JOIN users u ON u.id = b.borrower_id
"#;

/// Equipment row as written by bulk imports
#[derive(Debug, Clone)]
pub struct NewEquipment {
    pub name: String,
    pub category_id: Option<i32>,
    pub identifier: String,
    pub description: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct EquipmentRepository {
    pool: Pool<Postgres>,
}

impl EquipmentRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub async fn list_categories(&self) -> AppResult<Vec<EquipmentCategory>> {
        let rows = sqlx::query_as::<_, EquipmentCategory>(
            "SELECT * FROM equipment_categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_category(&self, id: i32) -> AppResult<EquipmentCategory> {
        sqlx::query_as::<_, EquipmentCategory>("SELECT * FROM equipment_categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn create_category(&self, data: &CategoryRequest) -> AppResult<EquipmentCategory> {
        let row = sqlx::query_as::<_, EquipmentCategory>(
            "INSERT INTO equipment_categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(data.name.trim())
        .bind(&data.description)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_category(
        &self,
        id: i32,
        data: &CategoryRequest,
    ) -> AppResult<EquipmentCategory> {
        sqlx::query_as::<_, EquipmentCategory>(
            "UPDATE equipment_categories SET name = $2, description = $3 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(&data.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment_categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        Ok(())
    }

    /// Category id for a name, creating the category if needed.
    /// Returns whether it was created.
    pub async fn get_or_create_category(&self, name: &str) -> AppResult<(i32, bool)> {
        let inserted: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO equipment_categories (name) VALUES ($1)
            ON CONFLICT (name) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(id) = inserted {
            return Ok((id, true));
        }

        let id: i32 = sqlx::query_scalar("SELECT id FROM equipment_categories WHERE name = $1")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok((id, false))
    }

    // -----------------------------------------------------------------------
    // Equipment
    // -----------------------------------------------------------------------

    /// List equipment with optional filters and pagination, ordered by name
    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<(Vec<Equipment>, i64)> {
        let window = PageWindow::new(query.page, query.per_page);

        let mut conditions = Vec::new();
        let mut idx = 1;

        if query.name.is_some() {
            conditions.push(format!("name ILIKE ${}", idx));
            idx += 1;
        }
        if query.category_id.is_some() {
            conditions.push(format!("category_id = ${}", idx));
            idx += 1;
        }
        if query.status.is_some() {
            conditions.push(format!("status = ${}", idx));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let name = query.name.as_ref().map(|n| format!("%{}%", n.trim()));

        let count_q = format!("SELECT COUNT(*) FROM equipment {}", where_clause);
        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_q);
        if let Some(ref n) = name { count_builder = count_builder.bind(n); }
        if let Some(c) = query.category_id { count_builder = count_builder.bind(c); }
        if let Some(s) = query.status { count_builder = count_builder.bind(s); }
        let total = count_builder.fetch_one(&self.pool).await?;

        let select_q = format!(
            "SELECT * FROM equipment {} ORDER BY name, identifier LIMIT {} OFFSET {}",
            where_clause,
            window.per_page,
            window.offset()
        );
        let mut builder = sqlx::query_as::<_, Equipment>(&select_q);
        if let Some(ref n) = name { builder = builder.bind(n); }
        if let Some(c) = query.category_id { builder = builder.bind(c); }
        if let Some(s) = query.status { builder = builder.bind(s); }

        let rows = builder.fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    pub async fn identifier_exists(&self, identifier: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM equipment WHERE identifier = $1)")
                .bind(identifier)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &EquipmentRequest, available: i32) -> AppResult<Equipment> {
        self.insert(&NewEquipment {
            name: data.name.trim().to_string(),
            category_id: data.category_id,
            identifier: data.identifier.trim().to_string(),
            description: data.description.clone(),
            quantity_total: data.quantity_total,
            quantity_available: available,
            status: data.status,
            purchase_date: data.purchase_date,
        })
        .await
    }

    pub async fn insert(&self, data: &NewEquipment) -> AppResult<Equipment> {
        let row = sqlx::query_as::<_, Equipment>(
            r#"
            INSERT INTO equipment (
                name, category_id, identifier, description,
                quantity_total, quantity_available, status, purchase_date
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(data.category_id)
        .bind(&data.identifier)
        .bind(&data.description)
        .bind(data.quantity_total)
        .bind(data.quantity_available)
        .bind(data.status)
        .bind(data.purchase_date)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(
        &self,
        id: i32,
        data: &EquipmentRequest,
        available: i32,
    ) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>(
            r#"
            UPDATE equipment SET
                name = $2, category_id = $3, identifier = $4, description = $5,
                quantity_total = $6, quantity_available = $7, status = $8, purchase_date = $9
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.category_id)
        .bind(data.identifier.trim())
        .bind(&data.description)
        .bind(data.quantity_total)
        .bind(available)
        .bind(data.status)
        .bind(data.purchase_date)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM equipment WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment {} not found", id)));
        }
        Ok(())
    }

    /// Load and row-lock an equipment record
    pub async fn lock(&self, tx: &mut Transaction<'static, Postgres>, id: i32) -> AppResult<Equipment> {
        sqlx::query_as::<_, Equipment>("SELECT * FROM equipment WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Equipment {} not found", id)))
    }

    /// Persist quantity and status after a transition
    pub async fn save_state(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        equipment: &Equipment,
    ) -> AppResult<()> {
        sqlx::query("UPDATE equipment SET quantity_available = $2, status = $3 WHERE id = $1")
            .bind(equipment.id)
            .bind(equipment.quantity_available)
            .bind(equipment.status)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Borrowings
    // -----------------------------------------------------------------------

    pub async fn insert_borrowing(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        equipment_id: i32,
        borrower_id: i32,
        borrow_date: DateTime<Utc>,
        due_date: DateTime<Utc>,
    ) -> AppResult<BorrowingRecord> {
        let row = sqlx::query_as::<_, BorrowingRecord>(
            r#"
            INSERT INTO borrowing_records (equipment_id, borrower_id, borrow_date, due_date, is_returned)
            VALUES ($1, $2, $3, $4, FALSE)
            RETURNING *
            "#,
        )
        .bind(equipment_id)
        .bind(borrower_id)
        .bind(borrow_date)
        .bind(due_date)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn get_borrowing(&self, id: i32) -> AppResult<BorrowingRecord> {
        sqlx::query_as::<_, BorrowingRecord>("SELECT * FROM borrowing_records WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing record {} not found", id)))
    }

    pub async fn lock_borrowing(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<BorrowingRecord> {
        sqlx::query_as::<_, BorrowingRecord>(
            "SELECT * FROM borrowing_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Borrowing record {} not found", id)))
    }

    pub async fn close_borrowing(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
        returned_at: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query("UPDATE borrowing_records SET is_returned = TRUE, return_date = $2 WHERE id = $1")
            .bind(id)
            .bind(returned_at)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    /// Unreturned borrowings of an equipment, other than `exclude_id`
    pub async fn count_outstanding(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        equipment_id: i32,
        exclude_id: i32,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM borrowing_records
            WHERE equipment_id = $1 AND NOT is_returned AND id != $2
            "#,
        )
        .bind(equipment_id)
        .bind(exclude_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }

    pub async fn get_borrowing_details(&self, id: i32) -> AppResult<BorrowingDetails> {
        let q = format!("{} WHERE b.id = $1", BORROWING_SELECT);
        sqlx::query_as::<_, BorrowingDetails>(&q)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrowing record {} not found", id)))
    }

    /// A user's borrowings, newest first
    pub async fn borrowings_for_user(&self, user_id: i32) -> AppResult<Vec<BorrowingDetails>> {
        let q = format!(
            "{} WHERE b.borrower_id = $1 ORDER BY b.borrow_date DESC, b.id DESC",
            BORROWING_SELECT
        );
        let rows = sqlx::query_as::<_, BorrowingDetails>(&q)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Borrowing history of an equipment, newest first
    pub async fn borrowings_for_equipment(
        &self,
        equipment_id: i32,
    ) -> AppResult<Vec<BorrowingDetails>> {
        let q = format!(
            "{} WHERE b.equipment_id = $1 ORDER BY b.borrow_date DESC, b.id DESC",
            BORROWING_SELECT
        );
        let rows = sqlx::query_as::<_, BorrowingDetails>(&q)
            .bind(equipment_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    // -----------------------------------------------------------------------
    // Repair requests
    // -----------------------------------------------------------------------

    pub async fn insert_repair(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        equipment_id: i32,
        reported_by: i32,
        description: &str,
    ) -> AppResult<RepairRequest> {
        let row = sqlx::query_as::<_, RepairRequest>(
            r#"
            INSERT INTO repair_requests (equipment_id, reported_by, description, status, reported_at)
            VALUES ($1, $2, $3, 'pending', $4)
            RETURNING *
            "#,
        )
        .bind(equipment_id)
        .bind(reported_by)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    pub async fn get_repair(&self, id: i32) -> AppResult<RepairRequest> {
        sqlx::query_as::<_, RepairRequest>("SELECT * FROM repair_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))
    }

    pub async fn lock_repair(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        id: i32,
    ) -> AppResult<RepairRequest> {
        sqlx::query_as::<_, RepairRequest>("SELECT * FROM repair_requests WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Repair request {} not found", id)))
    }

    pub async fn save_repair(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        repair: &RepairRequest,
    ) -> AppResult<RepairRequest> {
        let row = sqlx::query_as::<_, RepairRequest>(
            r#"
            UPDATE repair_requests
            SET status = $2, resolved_at = $3, resolution_notes = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(repair.id)
        .bind(repair.status)
        .bind(repair.resolved_at)
        .bind(&repair.resolution_notes)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row)
    }

    /// Pending or in-progress repairs of an equipment, other than `exclude_id`
    pub async fn count_open_repairs(
        &self,
        tx: &mut Transaction<'static, Postgres>,
        equipment_id: i32,
        exclude_id: i32,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM repair_requests
            WHERE equipment_id = $1 AND status IN ('pending', 'in_progress') AND id != $2
            "#,
        )
        .bind(equipment_id)
        .bind(exclude_id)
        .fetch_one(&mut **tx)
        .await?;
        Ok(count)
    }

    /// Repair requests, newest first
    pub async fn list_repairs(&self, query: &RepairQuery) -> AppResult<Vec<RepairRequest>> {
        let rows = sqlx::query_as::<_, RepairRequest>(
            r#"
            SELECT * FROM repair_requests
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::int IS NULL OR equipment_id = $2)
            ORDER BY reported_at DESC, id DESC
            "#,
        )
        .bind(query.status)
        .bind(query.equipment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
