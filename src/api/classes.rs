//! Class (student cohort) endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::course::{Class, ClassRequest, ClassStudent},
};

use super::AuthenticatedUser;

/// List classes
#[utoipa::path(
    get,
    path = "/classes",
    tag = "classes",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "List of classes", body = Vec<Class>)
    )
)]
pub async fn list_classes(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
) -> AppResult<Json<Vec<Class>>> {
    let classes = state.services.departments.list_classes().await?;
    Ok(Json(classes))
}

/// Get a class by ID
#[utoipa::path(
    get,
    path = "/classes/{id}",
    tag = "classes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Class", body = Class),
        (status = 404, description = "Class not found")
    )
)]
pub async fn get_class(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Class>> {
    let class = state.services.departments.get_class(id).await?;
    Ok(Json(class))
}

/// Create a class
#[utoipa::path(
    post,
    path = "/classes",
    tag = "classes",
    security(("bearer_auth" = [])),
    request_body = ClassRequest,
    responses(
        (status = 201, description = "Class created", body = Class),
        (status = 400, description = "Invalid input"),
        (status = 422, description = "Advisor is not a teacher")
    )
)]
pub async fn create_class(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<ClassRequest>,
) -> AppResult<(StatusCode, Json<Class>)> {
    current.require_staff()?;
    request.validate()?;

    let class = state.services.departments.create_class(&request).await?;
    Ok((StatusCode::CREATED, Json(class)))
}

/// Update a class
#[utoipa::path(
    put,
    path = "/classes/{id}",
    tag = "classes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Class ID")
    ),
    request_body = ClassRequest,
    responses(
        (status = 200, description = "Class updated", body = Class),
        (status = 404, description = "Class not found")
    )
)]
pub async fn update_class(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<ClassRequest>,
) -> AppResult<Json<Class>> {
    current.require_staff()?;
    request.validate()?;

    let class = state.services.departments.update_class(id, &request).await?;
    Ok(Json(class))
}

/// Delete a class
#[utoipa::path(
    delete,
    path = "/classes/{id}",
    tag = "classes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Class ID")
    ),
    responses(
        (status = 204, description = "Class deleted"),
        (status = 404, description = "Class not found")
    )
)]
pub async fn delete_class(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_staff()?;

    state.services.departments.delete_class(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Students assigned to a class
#[utoipa::path(
    get,
    path = "/classes/{id}/students",
    tag = "classes",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Class ID")
    ),
    responses(
        (status = 200, description = "Students in the class", body = Vec<ClassStudent>),
        (status = 404, description = "Class not found")
    )
)]
pub async fn list_class_students(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<ClassStudent>>> {
    current.require_any(&[crate::models::Role::Teacher, crate::models::Role::Staff])?;

    let students = state.services.departments.class_students(id).await?;
    Ok(Json(students))
}
