//! Venues and bookings service

use crate::{
    error::AppResult,
    models::venue::{BookingRequest, Venue, VenueBookingView, VenueRequest},
    repository::Repository,
};

#[derive(Clone)]
pub struct VenuesService {
    repository: Repository,
}

impl VenuesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Venue>> {
        self.repository.venues.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Venue> {
        self.repository.venues.get_by_id(id).await
    }

    pub async fn create(&self, data: &VenueRequest) -> AppResult<Venue> {
        self.repository.venues.create(data).await
    }

    pub async fn update(&self, id: i32, data: &VenueRequest) -> AppResult<Venue> {
        self.repository.venues.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.venues.delete(id).await
    }

    pub async fn list_bookings(&self, venue_id: Option<i32>) -> AppResult<Vec<VenueBookingView>> {
        if let Some(id) = venue_id {
            self.repository.venues.get_by_id(id).await?;
        }
        self.repository.venues.list_bookings(venue_id).await
    }

    pub async fn get_booking(&self, id: i32) -> AppResult<VenueBookingView> {
        self.repository.venues.get_booking(id).await
    }

    /// Book a venue. Overlapping bookings are accepted.
    pub async fn create_booking(&self, data: &BookingRequest) -> AppResult<VenueBookingView> {
        data.check_period()?;
        self.repository.venues.get_by_id(data.venue_id).await?;
        let booking = self.repository.venues.create_booking(data).await?;
        tracing::info!(booking_id = booking.id, venue_id = data.venue_id, "Venue booked");
        self.repository.venues.get_booking(booking.id).await
    }

    pub async fn update_booking(&self, id: i32, data: &BookingRequest) -> AppResult<VenueBookingView> {
        data.check_period()?;
        self.repository.venues.get_by_id(data.venue_id).await?;
        self.repository.venues.update_booking(id, data).await?;
        self.repository.venues.get_booking(id).await
    }

    pub async fn delete_booking(&self, id: i32) -> AppResult<()> {
        self.repository.venues.delete_booking(id).await
    }
}
