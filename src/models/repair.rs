//! Repair requests against equipment

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::impl_text_column;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RepairStatus {
    #[default]
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl RepairStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RepairStatus::Pending => "pending",
            RepairStatus::InProgress => "in_progress",
            RepairStatus::Resolved => "resolved",
            RepairStatus::Closed => "closed",
        }
    }

    /// Pending and in-progress requests keep equipment out of service
    pub fn is_open(&self) -> bool {
        matches!(self, RepairStatus::Pending | RepairStatus::InProgress)
    }
}

impl std::fmt::Display for RepairStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RepairStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(RepairStatus::Pending),
            "in_progress" => Ok(RepairStatus::InProgress),
            "resolved" => Ok(RepairStatus::Resolved),
            "closed" => Ok(RepairStatus::Closed),
            _ => Err(format!("Invalid repair status: {}", s)),
        }
    }
}

impl_text_column!(RepairStatus);

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct RepairRequest {
    pub id: i32,
    pub equipment_id: i32,
    pub reported_by: Option<i32>,
    pub description: String,
    pub status: RepairStatus,
    pub reported_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub resolution_notes: Option<String>,
}

impl RepairRequest {
    /// Move to `status`, keeping `resolved_at` consistent with it.
    ///
    /// Settling stamps `resolved_at` with the given time, or `now` when none
    /// was given and none is recorded. Reopening clears it.
    pub fn transition(
        &mut self,
        status: RepairStatus,
        resolved_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        if status.is_open() {
            self.resolved_at = None;
        } else if let Some(at) = resolved_at {
            self.resolved_at = Some(at);
        } else if self.resolved_at.is_none() {
            self.resolved_at = Some(now);
        }
    }
}

/// Report an issue with a piece of equipment
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRepairRequest {
    #[validate(length(min = 1, message = "Describe the problem"))]
    pub description: String,
}

/// Staff update of a repair request; absent fields are left untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateRepairRequest {
    pub status: Option<RepairStatus>,
    pub resolution_notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct RepairQuery {
    pub status: Option<RepairStatus>,
    pub equipment_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pending() -> RepairRequest {
        RepairRequest {
            id: 1,
            equipment_id: 1,
            reported_by: Some(2),
            description: "Lamp flickers".into(),
            status: RepairStatus::Pending,
            reported_at: Utc::now() - Duration::days(1),
            resolved_at: None,
            resolution_notes: None,
        }
    }

    #[test]
    fn test_open_statuses() {
        assert!(RepairStatus::Pending.is_open());
        assert!(RepairStatus::InProgress.is_open());
        assert!(!RepairStatus::Resolved.is_open());
        assert!(!RepairStatus::Closed.is_open());
        assert_eq!("IN_PROGRESS".parse::<RepairStatus>(), Ok(RepairStatus::InProgress));
    }

    #[test]
    fn test_resolving_stamps_resolved_at() {
        let now = Utc::now();
        let mut r = pending();
        r.transition(RepairStatus::Resolved, None, now);
        assert_eq!(r.resolved_at, Some(now));

        // a later close keeps the first timestamp
        r.transition(RepairStatus::Closed, None, now + Duration::hours(1));
        assert_eq!(r.resolved_at, Some(now));
    }

    #[test]
    fn test_explicit_resolved_at_wins() {
        let now = Utc::now();
        let given = now - Duration::hours(3);
        let mut r = pending();
        r.transition(RepairStatus::Closed, Some(given), now);
        assert_eq!(r.resolved_at, Some(given));
    }

    #[test]
    fn test_reopening_clears_resolved_at() {
        let now = Utc::now();
        let mut r = pending();
        r.transition(RepairStatus::Resolved, None, now);
        r.transition(RepairStatus::InProgress, None, now);
        assert_eq!(r.resolved_at, None);
        assert_eq!(r.status, RepairStatus::InProgress);
    }
}
