//! User management endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        department::{EmployeeProfile, EmployeeProfileRequest, StudentProfile, StudentProfileRequest},
        user::{CreateUser, UpdateUser, User, UserDetails, UserQuery},
        PageWindow,
    },
};

use super::{AuthenticatedUser, PaginatedResponse, UserPage};

/// List users with search and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    params(UserQuery),
    responses(
        (status = 200, description = "List of users", body = UserPage),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_users(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Query(query): Query<UserQuery>,
) -> AppResult<Json<PaginatedResponse<User>>> {
    current.require_staff()?;

    let (users, total) = state.services.users.search_users(&query).await?;
    let window = PageWindow::new(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items: users,
        total,
        page: window.page,
        per_page: window.per_page,
    }))
}

/// Get user details by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User details", body = UserDetails),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<UserDetails>> {
    if current.id != id {
        current.require_staff()?;
    }

    let details = state.services.users.get_details(id).await?;
    Ok(Json(details))
}

/// Create a new user with any role
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Admin privileges required"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn create_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(user): Json<CreateUser>,
) -> AppResult<(StatusCode, Json<User>)> {
    current.require_admin()?;
    user.validate()?;

    let created = state.services.users.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already exists")
    )
)]
pub async fn update_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(user): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    current.require_admin()?;
    user.validate()?;

    let updated = state.services.users.update_user(id, user).await?;
    Ok(Json(updated))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Cannot delete own account")
    )
)]
pub async fn delete_user(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_admin()?;

    state.services.users.delete_user(id, &current).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Create or replace a student's profile
#[utoipa::path(
    put,
    path = "/users/{id}/student-profile",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = StudentProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = StudentProfile),
        (status = 404, description = "User or class not found"),
        (status = 422, description = "User is not a student")
    )
)]
pub async fn upsert_student_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(profile): Json<StudentProfileRequest>,
) -> AppResult<Json<StudentProfile>> {
    current.require_staff()?;
    profile.validate()?;

    let saved = state.services.users.upsert_student_profile(id, &profile).await?;
    Ok(Json(saved))
}

/// Create or replace an employee's profile
#[utoipa::path(
    put,
    path = "/users/{id}/employee-profile",
    tag = "users",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    request_body = EmployeeProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = EmployeeProfile),
        (status = 404, description = "User or department not found"),
        (status = 422, description = "User is a student")
    )
)]
pub async fn upsert_employee_profile(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(profile): Json<EmployeeProfileRequest>,
) -> AppResult<Json<EmployeeProfile>> {
    current.require_admin()?;
    profile.validate()?;

    let saved = state.services.users.upsert_employee_profile(id, &profile).await?;
    Ok(Json(saved))
}
