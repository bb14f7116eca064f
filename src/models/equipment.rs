//! Equipment inventory, borrowing records and the availability state machine

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::impl_text_column;
use super::repair::RepairRequest;
use crate::error::{AppError, AppResult};

/// Availability of an equipment record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    #[default]
    Available,
    Borrowed,
    UnderRepair,
}

impl EquipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "available",
            EquipmentStatus::Borrowed => "borrowed",
            EquipmentStatus::UnderRepair => "under_repair",
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EquipmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "available" => Ok(EquipmentStatus::Available),
            "borrowed" => Ok(EquipmentStatus::Borrowed),
            "under_repair" => Ok(EquipmentStatus::UnderRepair),
            _ => Err(format!("Invalid equipment status: {}", s)),
        }
    }
}

impl_text_column!(EquipmentStatus);

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentCategory {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    pub id: i32,
    pub name: String,
    pub category_id: Option<i32>,
    /// Serial number or asset tag, unique
    pub identifier: String,
    pub description: Option<String>,
    pub quantity_total: i32,
    pub quantity_available: i32,
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
}

impl Equipment {
    pub fn can_borrow(&self) -> bool {
        self.status == EquipmentStatus::Available && self.quantity_available > 0
    }

    /// Take one unit out. The last unit flips the status to borrowed.
    pub fn apply_borrow(&mut self) -> AppResult<()> {
        if !self.can_borrow() {
            return Err(AppError::Conflict(format!(
                "Equipment '{}' is not available for borrowing",
                self.name
            )));
        }
        self.quantity_available -= 1;
        if self.quantity_available == 0 && self.status != EquipmentStatus::UnderRepair {
            self.status = EquipmentStatus::Borrowed;
        }
        Ok(())
    }

    /// Put one unit back. `other_outstanding` counts unreturned borrowings
    /// other than the one being closed.
    pub fn apply_return(&mut self, other_outstanding: i64) {
        self.quantity_available = (self.quantity_available + 1).min(self.quantity_total);
        if other_outstanding == 0 && self.status != EquipmentStatus::UnderRepair {
            self.status = EquipmentStatus::Available;
        }
    }

    /// A repair request was filed or reopened
    pub fn apply_repair_opened(&mut self) {
        if self.status == EquipmentStatus::Available {
            self.status = EquipmentStatus::UnderRepair;
        }
    }

    /// A repair request was resolved or closed. `other_open` counts pending
    /// or in-progress requests other than this one.
    pub fn apply_repair_settled(&mut self, other_open: i64) {
        if other_open == 0 && self.status == EquipmentStatus::UnderRepair {
            self.status = EquipmentStatus::Available;
        }
    }
}

/// Keep an available count inside `0..=total`
pub fn clamp_available(available: i32, total: i32) -> i32 {
    available.clamp(0, total.max(0))
}

/// Create or replace an equipment record
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EquipmentRequest {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,
    pub category_id: Option<i32>,
    #[validate(length(min = 1, max = 100, message = "Identifier must be 1-100 characters"))]
    pub identifier: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Total quantity cannot be negative"))]
    pub quantity_total: i32,
    /// Defaults to the total quantity
    #[validate(range(min = 0, message = "Available quantity cannot be negative"))]
    pub quantity_available: Option<i32>,
    #[serde(default)]
    pub status: EquipmentStatus,
    pub purchase_date: Option<NaiveDate>,
}

impl EquipmentRequest {
    /// Available quantity after defaulting, rejected when above the total
    pub fn available(&self) -> AppResult<i32> {
        let available = self.quantity_available.unwrap_or(self.quantity_total);
        if available > self.quantity_total {
            return Err(AppError::Validation(
                "quantity_available: cannot exceed quantity_total".to_string(),
            ));
        }
        Ok(available)
    }
}

/// Equipment list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct EquipmentQuery {
    /// Name contains (case-insensitive)
    pub name: Option<String>,
    pub category_id: Option<i32>,
    pub status: Option<EquipmentStatus>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Equipment with its category, loans and repair tickets
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EquipmentDetail {
    pub equipment: Equipment,
    pub category: Option<EquipmentCategory>,
    /// Newest first
    pub borrowings: Vec<BorrowingDetails>,
    /// Newest first
    pub repair_requests: Vec<RepairRequest>,
}

// ---------------------------------------------------------------------------
// Borrowing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingRecord {
    pub id: i32,
    pub equipment_id: i32,
    pub borrower_id: i32,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
}

/// Borrowing record with names and the overdue flag
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BorrowingDetails {
    pub id: i32,
    pub equipment_id: i32,
    pub equipment_name: String,
    pub equipment_identifier: String,
    pub borrower_id: i32,
    pub borrower_username: String,
    pub borrow_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
    pub is_returned: bool,
    pub is_overdue: bool,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BorrowRequest {
    /// Defaults to now plus the configured loan period
    pub due_date: Option<DateTime<Utc>>,
}

/// Pick the due date for a new borrowing
pub fn resolve_due_date(
    requested: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    default_loan_days: i64,
) -> AppResult<DateTime<Utc>> {
    match requested {
        Some(due) if due <= now => Err(AppError::Validation(
            "due_date: must be in the future".to_string(),
        )),
        Some(due) => Ok(due),
        None => Ok(now + Duration::days(default_loan_days)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn equipment(total: i32, available: i32, status: EquipmentStatus) -> Equipment {
        Equipment {
            id: 1,
            name: "Projector".into(),
            category_id: None,
            identifier: "PJ-001".into(),
            description: None,
            quantity_total: total,
            quantity_available: available,
            status,
            purchase_date: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        assert_eq!("under_repair".parse::<EquipmentStatus>(), Ok(EquipmentStatus::UnderRepair));
        assert_eq!(EquipmentStatus::Borrowed.to_string(), "borrowed");
        assert_eq!(
            serde_json::to_string(&EquipmentStatus::UnderRepair).unwrap(),
            "\"under_repair\""
        );
        assert!("lost".parse::<EquipmentStatus>().is_err());
    }

    #[test]
    fn test_borrow_decrements_by_one() {
        let mut e = equipment(3, 3, EquipmentStatus::Available);
        e.apply_borrow().unwrap();
        assert_eq!(e.quantity_available, 2);
        assert_eq!(e.status, EquipmentStatus::Available);
    }

    #[test]
    fn test_last_unit_marks_borrowed() {
        let mut e = equipment(2, 1, EquipmentStatus::Available);
        e.apply_borrow().unwrap();
        assert_eq!(e.quantity_available, 0);
        assert_eq!(e.status, EquipmentStatus::Borrowed);

        let err = e.apply_borrow().unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(e.quantity_available, 0);
    }

    #[test]
    fn test_cannot_borrow_under_repair() {
        let mut e = equipment(2, 2, EquipmentStatus::UnderRepair);
        assert!(!e.can_borrow());
        assert!(e.apply_borrow().is_err());
        assert_eq!(e.quantity_available, 2);
    }

    #[test]
    fn test_return_increments_and_clamps() {
        let mut e = equipment(2, 0, EquipmentStatus::Borrowed);
        e.apply_return(1);
        assert_eq!(e.quantity_available, 1);
        assert_eq!(e.status, EquipmentStatus::Borrowed);

        e.apply_return(0);
        assert_eq!(e.quantity_available, 2);
        assert_eq!(e.status, EquipmentStatus::Available);

        e.apply_return(0);
        assert_eq!(e.quantity_available, 2);
    }

    #[test]
    fn test_return_keeps_repair_status() {
        let mut e = equipment(1, 0, EquipmentStatus::UnderRepair);
        e.apply_return(0);
        assert_eq!(e.quantity_available, 1);
        assert_eq!(e.status, EquipmentStatus::UnderRepair);
    }

    #[test]
    fn test_repair_transitions() {
        let mut e = equipment(1, 1, EquipmentStatus::Available);
        e.apply_repair_opened();
        assert_eq!(e.status, EquipmentStatus::UnderRepair);

        e.apply_repair_settled(1);
        assert_eq!(e.status, EquipmentStatus::UnderRepair);

        e.apply_repair_settled(0);
        assert_eq!(e.status, EquipmentStatus::Available);
    }

    #[test]
    fn test_repair_open_leaves_borrowed_alone() {
        let mut e = equipment(1, 0, EquipmentStatus::Borrowed);
        e.apply_repair_opened();
        assert_eq!(e.status, EquipmentStatus::Borrowed);
        e.apply_repair_settled(0);
        assert_eq!(e.status, EquipmentStatus::Borrowed);
    }

    #[test]
    fn test_clamp_available() {
        assert_eq!(clamp_available(5, 3), 3);
        assert_eq!(clamp_available(-2, 3), 0);
        assert_eq!(clamp_available(2, 3), 2);
    }

    #[test]
    fn test_request_available_defaults_to_total() {
        let mut req = EquipmentRequest {
            name: "Laptop".into(),
            category_id: None,
            identifier: "LT-1".into(),
            description: None,
            quantity_total: 4,
            quantity_available: None,
            status: EquipmentStatus::Available,
            purchase_date: None,
        };
        assert_eq!(req.available().unwrap(), 4);

        req.quantity_available = Some(5);
        assert!(matches!(req.available(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_due_date_resolution() {
        let now = Utc::now();
        assert_eq!(resolve_due_date(None, now, 7).unwrap(), now + Duration::days(7));

        let later = now + Duration::days(2);
        assert_eq!(resolve_due_date(Some(later), now, 7).unwrap(), later);

        let past = now - Duration::hours(1);
        assert!(resolve_due_date(Some(past), now, 7).is_err());
    }
}
