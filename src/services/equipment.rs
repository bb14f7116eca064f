//! Equipment service: inventory, borrowing and repairs
//!
//! Every transition that moves `quantity_available` or `status` runs in one
//! transaction holding a `FOR UPDATE` lock on the equipment row.

use chrono::Utc;

use crate::{
    config::BorrowingConfig,
    error::{AppError, AppResult},
    models::{
        equipment::{
            resolve_due_date, BorrowRequest, BorrowingDetails, CategoryRequest, Equipment,
            EquipmentCategory, EquipmentDetail, EquipmentQuery, EquipmentRequest,
        },
        repair::{CreateRepairRequest, RepairQuery, RepairRequest, UpdateRepairRequest},
        user::CurrentUser,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct EquipmentService {
    repository: Repository,
    config: BorrowingConfig,
}

impl EquipmentService {
    pub fn new(repository: Repository, config: BorrowingConfig) -> Self {
        Self { repository, config }
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub async fn list_categories(&self) -> AppResult<Vec<EquipmentCategory>> {
        self.repository.equipment.list_categories().await
    }

    pub async fn create_category(&self, data: &CategoryRequest) -> AppResult<EquipmentCategory> {
        self.repository.equipment.create_category(data).await
    }

    pub async fn update_category(
        &self,
        id: i32,
        data: &CategoryRequest,
    ) -> AppResult<EquipmentCategory> {
        self.repository.equipment.update_category(id, data).await
    }

    pub async fn delete_category(&self, id: i32) -> AppResult<()> {
        self.repository.equipment.delete_category(id).await
    }

    // -----------------------------------------------------------------------
    // Equipment
    // -----------------------------------------------------------------------

    pub async fn list(&self, query: &EquipmentQuery) -> AppResult<(Vec<Equipment>, i64)> {
        self.repository.equipment.list(query).await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Equipment> {
        self.repository.equipment.get_by_id(id).await
    }

    /// Equipment with category, borrowing history and repair requests
    pub async fn get_detail(&self, id: i32) -> AppResult<EquipmentDetail> {
        let equipment = self.repository.equipment.get_by_id(id).await?;
        let category = match equipment.category_id {
            Some(category_id) => Some(self.repository.equipment.get_category(category_id).await?),
            None => None,
        };
        let borrowings = self.repository.equipment.borrowings_for_equipment(id).await?;
        let repair_requests = self
            .repository
            .equipment
            .list_repairs(&RepairQuery {
                status: None,
                equipment_id: Some(id),
            })
            .await?;

        Ok(EquipmentDetail {
            equipment,
            category,
            borrowings,
            repair_requests,
        })
    }

    pub async fn create(&self, data: &EquipmentRequest) -> AppResult<Equipment> {
        let available = data.available()?;
        self.check_category(data.category_id).await?;
        let equipment = self.repository.equipment.create(data, available).await?;
        tracing::info!(equipment_id = equipment.id, identifier = %equipment.identifier, "Equipment created");
        Ok(equipment)
    }

    pub async fn update(&self, id: i32, data: &EquipmentRequest) -> AppResult<Equipment> {
        let available = data.available()?;
        self.check_category(data.category_id).await?;
        self.repository.equipment.update(id, data, available).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.equipment.delete(id).await
    }

    async fn check_category(&self, category_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = category_id {
            self.repository.equipment.get_category(id).await?;
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Borrowing
    // -----------------------------------------------------------------------

    /// Borrow one unit of equipment
    pub async fn borrow(
        &self,
        actor: &CurrentUser,
        equipment_id: i32,
        data: &BorrowRequest,
    ) -> AppResult<BorrowingDetails> {
        let now = Utc::now();
        let due_date = resolve_due_date(data.due_date, now, self.config.default_loan_days)?;

        let repo = &self.repository.equipment;
        let mut tx = repo.begin().await?;

        let mut equipment = repo.lock(&mut tx, equipment_id).await?;
        equipment.apply_borrow()?;
        repo.save_state(&mut tx, &equipment).await?;
        let record = repo
            .insert_borrowing(&mut tx, equipment_id, actor.id, now, due_date)
            .await?;

        tx.commit().await?;

        tracing::info!(
            borrowing_id = record.id,
            equipment_id,
            borrower_id = actor.id,
            remaining = equipment.quantity_available,
            "Equipment borrowed"
        );
        repo.get_borrowing_details(record.id).await
    }

    /// Return a borrowing; the borrower, staff or an administrator may
    pub async fn return_borrowing(
        &self,
        actor: &CurrentUser,
        borrowing_id: i32,
    ) -> AppResult<BorrowingDetails> {
        let repo = &self.repository.equipment;

        // Equipment row is locked before the borrowing row, same order as borrow()
        let equipment_id = repo.get_borrowing(borrowing_id).await?.equipment_id;

        let mut tx = repo.begin().await?;
        let mut equipment = repo.lock(&mut tx, equipment_id).await?;
        let record = repo.lock_borrowing(&mut tx, borrowing_id).await?;

        if record.borrower_id != actor.id && !actor.is_staff_or_admin() {
            return Err(AppError::Authorization(
                "You can only return your own borrowings".to_string(),
            ));
        }
        if record.is_returned {
            return Err(AppError::Conflict("This item has already been returned".to_string()));
        }

        let other_outstanding = repo
            .count_outstanding(&mut tx, equipment_id, borrowing_id)
            .await?;
        equipment.apply_return(other_outstanding);

        repo.close_borrowing(&mut tx, borrowing_id, Utc::now()).await?;
        repo.save_state(&mut tx, &equipment).await?;

        tx.commit().await?;

        tracing::info!(
            borrowing_id,
            equipment_id,
            available = equipment.quantity_available,
            status = %equipment.status,
            "Equipment returned"
        );
        repo.get_borrowing_details(borrowing_id).await
    }

    /// The actor's borrowings, newest first
    pub async fn my_borrowings(&self, actor: &CurrentUser) -> AppResult<Vec<BorrowingDetails>> {
        self.repository.equipment.borrowings_for_user(actor.id).await
    }

    // -----------------------------------------------------------------------
    // Repairs
    // -----------------------------------------------------------------------

    /// File a repair request; available equipment goes under repair
    pub async fn report_issue(
        &self,
        actor: &CurrentUser,
        equipment_id: i32,
        data: &CreateRepairRequest,
    ) -> AppResult<RepairRequest> {
        let repo = &self.repository.equipment;
        let mut tx = repo.begin().await?;

        let mut equipment = repo.lock(&mut tx, equipment_id).await?;
        let request = repo
            .insert_repair(&mut tx, equipment_id, actor.id, data.description.trim())
            .await?;
        equipment.apply_repair_opened();
        repo.save_state(&mut tx, &equipment).await?;

        tx.commit().await?;

        tracing::info!(repair_id = request.id, equipment_id, reporter_id = actor.id, "Repair request filed");
        Ok(request)
    }

    pub async fn list_repairs(&self, query: &RepairQuery) -> AppResult<Vec<RepairRequest>> {
        self.repository.equipment.list_repairs(query).await
    }

    pub async fn get_repair(&self, id: i32) -> AppResult<RepairRequest> {
        self.repository.equipment.get_repair(id).await
    }

    /// Change status or notes of a repair request and settle the equipment status
    pub async fn update_repair(&self, id: i32, data: &UpdateRepairRequest) -> AppResult<RepairRequest> {
        let repo = &self.repository.equipment;
        let equipment_id = repo.get_repair(id).await?.equipment_id;

        let mut tx = repo.begin().await?;
        let mut equipment = repo.lock(&mut tx, equipment_id).await?;
        let mut request = repo.lock_repair(&mut tx, id).await?;

        if let Some(notes) = &data.resolution_notes {
            request.resolution_notes = Some(notes.clone());
        }
        let status = data.status.unwrap_or(request.status);
        request.transition(status, data.resolved_at, Utc::now());

        if status.is_open() {
            equipment.apply_repair_opened();
        } else {
            let other_open = repo.count_open_repairs(&mut tx, equipment_id, id).await?;
            equipment.apply_repair_settled(other_open);
        }

        let saved = repo.save_repair(&mut tx, &request).await?;
        repo.save_state(&mut tx, &equipment).await?;

        tx.commit().await?;

        tracing::info!(repair_id = id, equipment_id, status = %saved.status, equipment_status = %equipment.status, "Repair request updated");
        Ok(saved)
    }
}
