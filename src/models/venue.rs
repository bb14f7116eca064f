//! Venues and venue bookings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Venue {
    pub id: i32,
    pub name: String,
    pub capacity: Option<i32>,
    pub location: Option<String>,
    pub has_projector: bool,
    pub has_whiteboard: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VenueRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(range(min = 0, message = "Capacity cannot be negative"))]
    pub capacity: Option<i32>,
    pub location: Option<String>,
    #[serde(default)]
    pub has_projector: bool,
    #[serde(default)]
    pub has_whiteboard: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct VenueBooking {
    pub id: i32,
    pub venue_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub booked_by_name: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl VenueBooking {
    /// `2025-03-01 09:00 - 2025-03-01 11:00`
    pub fn booking_period_display(&self) -> String {
        format_period(self.start_time, self.end_time)
    }
}

fn format_period(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "{} - {}",
        start.format("%Y-%m-%d %H:%M"),
        end.format("%Y-%m-%d %H:%M")
    )
}

/// Booking as returned by the API, with venue name and display period
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct VenueBookingView {
    #[serde(flatten)]
    pub booking: VenueBooking,
    pub venue_name: String,
    pub booking_period_display: String,
}

impl VenueBookingView {
    pub fn new(booking: VenueBooking, venue_name: String) -> Self {
        let booking_period_display = booking.booking_period_display();
        Self {
            booking,
            venue_name,
            booking_period_display,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BookingRequest {
    pub venue_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[validate(length(min = 1, max = 100, message = "Booker name must be 1-100 characters"))]
    pub booked_by_name: String,
    pub notes: Option<String>,
}

impl BookingRequest {
    /// End time must be strictly after start time
    pub fn check_period(&self) -> AppResult<()> {
        if self.end_time <= self.start_time {
            return Err(AppError::Validation(
                "end_time: must be after start_time".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct BookingQuery {
    pub venue_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn request(start: DateTime<Utc>, end: DateTime<Utc>) -> BookingRequest {
        BookingRequest {
            venue_id: 1,
            start_time: start,
            end_time: end,
            booked_by_name: "Chess club".into(),
            notes: None,
        }
    }

    #[test]
    fn test_booking_period_must_be_positive() {
        let start = Utc::now();
        assert!(request(start, start + Duration::hours(2)).check_period().is_ok());
        assert!(request(start, start).check_period().is_err());
        assert!(matches!(
            request(start, start - Duration::minutes(5)).check_period(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_booking_period_display() {
        let start = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let booking = VenueBooking {
            id: 1,
            venue_id: 1,
            start_time: start,
            end_time: start + Duration::minutes(90),
            booked_by_name: "Drama".into(),
            notes: None,
            created_at: start,
            updated_at: start,
        };
        assert_eq!(
            booking.booking_period_display(),
            "2025-03-01 09:00 - 2025-03-01 10:30"
        );
    }
}
