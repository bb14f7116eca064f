//! Venues and bookings repository

use chrono::Utc;
use sqlx::{FromRow, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::venue::{BookingRequest, Venue, VenueBooking, VenueBookingView, VenueRequest},
};

#[derive(FromRow)]
struct BookingRow {
    #[sqlx(flatten)]
    booking: VenueBooking,
    venue_name: String,
}

impl From<BookingRow> for VenueBookingView {
    fn from(row: BookingRow) -> Self {
        VenueBookingView::new(row.booking, row.venue_name)
    }
}

const BOOKING_SELECT: &str = r#"
    SELECT b.*, v.name AS venue_name
    FROM venue_bookings b
    JOIN venues v ON v.id = b.venue_id
"#;

#[derive(Clone)]
pub struct VenuesRepository {
    pool: Pool<Postgres>,
}

impl VenuesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> AppResult<Vec<Venue>> {
        let rows = sqlx::query_as::<_, Venue>("SELECT * FROM venues ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Venue> {
        sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Venue {} not found", id)))
    }

    pub async fn name_exists(&self, name: &str) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM venues WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    pub async fn create(&self, data: &VenueRequest) -> AppResult<Venue> {
        let row = sqlx::query_as::<_, Venue>(
            r#"
            INSERT INTO venues (name, capacity, location, has_projector, has_whiteboard)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(data.capacity)
        .bind(&data.location)
        .bind(data.has_projector)
        .bind(data.has_whiteboard)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update(&self, id: i32, data: &VenueRequest) -> AppResult<Venue> {
        sqlx::query_as::<_, Venue>(
            r#"
            UPDATE venues
            SET name = $2, capacity = $3, location = $4, has_projector = $5, has_whiteboard = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.name.trim())
        .bind(data.capacity)
        .bind(&data.location)
        .bind(data.has_projector)
        .bind(data.has_whiteboard)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Venue {} not found", id)))
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Venue {} not found", id)));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Bookings
    // -----------------------------------------------------------------------

    /// Bookings ordered by start time, optionally for one venue
    pub async fn list_bookings(&self, venue_id: Option<i32>) -> AppResult<Vec<VenueBookingView>> {
        let q = format!(
            "{} WHERE ($1::int IS NULL OR b.venue_id = $1) ORDER BY b.start_time",
            BOOKING_SELECT
        );
        let rows = sqlx::query_as::<_, BookingRow>(&q)
            .bind(venue_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get_booking(&self, id: i32) -> AppResult<VenueBookingView> {
        let q = format!("{} WHERE b.id = $1", BOOKING_SELECT);
        sqlx::query_as::<_, BookingRow>(&q)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    pub async fn create_booking(&self, data: &BookingRequest) -> AppResult<VenueBooking> {
        let now = Utc::now();
        let row = sqlx::query_as::<_, VenueBooking>(
            r#"
            INSERT INTO venue_bookings (
                venue_id, start_time, end_time, booked_by_name, notes, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING *
            "#,
        )
        .bind(data.venue_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.booked_by_name.trim())
        .bind(&data.notes)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_booking(&self, id: i32, data: &BookingRequest) -> AppResult<VenueBooking> {
        sqlx::query_as::<_, VenueBooking>(
            r#"
            UPDATE venue_bookings
            SET venue_id = $2, start_time = $3, end_time = $4,
                booked_by_name = $5, notes = $6, updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(data.venue_id)
        .bind(data.start_time)
        .bind(data.end_time)
        .bind(data.booked_by_name.trim())
        .bind(&data.notes)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    pub async fn delete_booking(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM venue_bookings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        }
        Ok(())
    }
}
