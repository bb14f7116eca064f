//! Venue and booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::venue::{BookingQuery, BookingRequest, Venue, VenueBookingView, VenueRequest},
};

use super::AuthenticatedUser;

/// List venues
#[utoipa::path(
    get,
    path = "/venues",
    tag = "venues",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of venues", body = Vec<Venue>)
    )
)]
pub async fn list_venues(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
) -> AppResult<Json<Vec<Venue>>> {
    let venues = state.services.venues.list().await?;
    Ok(Json(venues))
}

/// Get a venue
#[utoipa::path(
    get,
    path = "/venues/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    responses(
        (status = 200, description = "Venue", body = Venue),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn get_venue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Venue>> {
    let venue = state.services.venues.get_by_id(id).await?;
    Ok(Json(venue))
}

/// Create a venue
#[utoipa::path(
    post,
    path = "/venues",
    tag = "venues",
    security(("bearer_auth" = [])),
    request_body = VenueRequest,
    responses(
        (status = 201, description = "Venue created", body = Venue),
        (status = 409, description = "Venue name already exists")
    )
)]
pub async fn create_venue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<VenueRequest>,
) -> AppResult<(StatusCode, Json<Venue>)> {
    current.require_staff()?;
    request.validate()?;

    let venue = state.services.venues.create(&request).await?;
    Ok((StatusCode::CREATED, Json(venue)))
}

/// Update a venue
#[utoipa::path(
    put,
    path = "/venues/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    request_body = VenueRequest,
    responses(
        (status = 200, description = "Venue updated", body = Venue),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn update_venue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<VenueRequest>,
) -> AppResult<Json<Venue>> {
    current.require_staff()?;
    request.validate()?;

    let venue = state.services.venues.update(id, &request).await?;
    Ok(Json(venue))
}

/// Delete a venue and its bookings
#[utoipa::path(
    delete,
    path = "/venues/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Venue ID")
    ),
    responses(
        (status = 204, description = "Venue deleted"),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn delete_venue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_staff()?;

    state.services.venues.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List bookings, optionally for one venue
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(BookingQuery),
    responses(
        (status = 200, description = "Bookings ordered by start time", body = Vec<VenueBookingView>),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<Vec<VenueBookingView>>> {
    let bookings = state.services.venues.list_bookings(query.venue_id).await?;
    Ok(Json(bookings))
}

/// Get a booking
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking", body = VenueBookingView),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<VenueBookingView>> {
    let booking = state.services.venues.get_booking(id).await?;
    Ok(Json(booking))
}

/// Book a venue
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "venues",
    security(("bearer_auth" = [])),
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Booking created", body = VenueBookingView),
        (status = 400, description = "End time not after start time"),
        (status = 404, description = "Venue not found")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<BookingRequest>,
) -> AppResult<(StatusCode, Json<VenueBookingView>)> {
    current.require_staff()?;
    request.validate()?;

    let booking = state.services.venues.create_booking(&request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Update a booking
#[utoipa::path(
    put,
    path = "/bookings/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = BookingRequest,
    responses(
        (status = 200, description = "Booking updated", body = VenueBookingView),
        (status = 404, description = "Booking or venue not found")
    )
)]
pub async fn update_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<BookingRequest>,
) -> AppResult<Json<VenueBookingView>> {
    current.require_staff()?;
    request.validate()?;

    let booking = state.services.venues.update_booking(id, &request).await?;
    Ok(Json(booking))
}

/// Cancel a booking
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "venues",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_staff()?;

    state.services.venues.delete_booking(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
