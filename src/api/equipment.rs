//! Equipment inventory, borrowing and repair endpoints

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        equipment::{
            BorrowRequest, BorrowingDetails, CategoryRequest, Equipment, EquipmentCategory,
            EquipmentDetail, EquipmentQuery, EquipmentRequest,
        },
        repair::{CreateRepairRequest, RepairQuery, RepairRequest, UpdateRepairRequest},
        PageWindow,
    },
};

use super::{AuthenticatedUser, EquipmentPage, PaginatedResponse};

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// List equipment categories
#[utoipa::path(
    get,
    path = "/equipment-categories",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Categories", body = Vec<EquipmentCategory>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
) -> AppResult<Json<Vec<EquipmentCategory>>> {
    let categories = state.services.equipment.list_categories().await?;
    Ok(Json(categories))
}

/// Create an equipment category
#[utoipa::path(
    post,
    path = "/equipment-categories",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Category created", body = EquipmentCategory),
        (status = 409, description = "Category name already exists")
    )
)]
pub async fn create_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<CategoryRequest>,
) -> AppResult<(StatusCode, Json<EquipmentCategory>)> {
    current.require_staff()?;
    request.validate()?;

    let category = state.services.equipment.create_category(&request).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// Rename or describe a category
#[utoipa::path(
    put,
    path = "/equipment-categories/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = EquipmentCategory),
        (status = 404, description = "Category not found")
    )
)]
pub async fn update_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CategoryRequest>,
) -> AppResult<Json<EquipmentCategory>> {
    current.require_staff()?;
    request.validate()?;

    let category = state.services.equipment.update_category(id, &request).await?;
    Ok(Json(category))
}

/// Delete a category; its equipment becomes uncategorized
#[utoipa::path(
    delete,
    path = "/equipment-categories/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Category ID")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_staff()?;

    state.services.equipment.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Equipment
// ---------------------------------------------------------------------------

/// List equipment with filters and pagination
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentQuery),
    responses(
        (status = 200, description = "List of equipment", body = EquipmentPage)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Query(query): Query<EquipmentQuery>,
) -> AppResult<Json<PaginatedResponse<Equipment>>> {
    let (items, total) = state.services.equipment.list(&query).await?;
    let window = PageWindow::new(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items,
        total,
        page: window.page,
        per_page: window.per_page,
    }))
}

/// Get equipment with its category, borrowings and repair requests
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID")
    ),
    responses(
        (status = 200, description = "Equipment details", body = EquipmentDetail),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<EquipmentDetail>> {
    let detail = state.services.equipment.get_detail(id).await?;
    Ok(Json(detail))
}

/// Register equipment
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    request_body = EquipmentRequest,
    responses(
        (status = 201, description = "Equipment created", body = Equipment),
        (status = 400, description = "Invalid quantities"),
        (status = 409, description = "Identifier already exists")
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<EquipmentRequest>,
) -> AppResult<(StatusCode, Json<Equipment>)> {
    current.require_staff()?;
    request.validate()?;

    let equipment = state.services.equipment.create(&request).await?;
    Ok((StatusCode::CREATED, Json(equipment)))
}

/// Update equipment
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID")
    ),
    request_body = EquipmentRequest,
    responses(
        (status = 200, description = "Equipment updated", body = Equipment),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<EquipmentRequest>,
) -> AppResult<Json<Equipment>> {
    current.require_staff()?;
    request.validate()?;

    let equipment = state.services.equipment.update(id, &request).await?;
    Ok(Json(equipment))
}

/// Delete equipment
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID")
    ),
    responses(
        (status = 204, description = "Equipment deleted"),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    current.require_staff()?;

    state.services.equipment.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Borrowing
// ---------------------------------------------------------------------------

/// Borrow one unit of equipment
#[utoipa::path(
    post,
    path = "/equipment/{id}/borrow",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID")
    ),
    request_body = BorrowRequest,
    responses(
        (status = 201, description = "Equipment borrowed", body = BorrowingDetails),
        (status = 400, description = "Due date in the past"),
        (status = 404, description = "Equipment not found"),
        (status = 409, description = "Equipment not available")
    )
)]
pub async fn borrow_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<BorrowingDetails>)> {
    let request = parse_borrow_body(&body)?;

    let borrowing = state.services.equipment.borrow(&current, id, &request).await?;
    Ok((StatusCode::CREATED, Json(borrowing)))
}

/// An empty body borrows with the default due date
fn parse_borrow_body(body: &[u8]) -> AppResult<BorrowRequest> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(BorrowRequest::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Invalid borrow request: {}", e)))
}

/// Return borrowed equipment
#[utoipa::path(
    post,
    path = "/borrowings/{id}/return",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrowing ID")
    ),
    responses(
        (status = 200, description = "Equipment returned", body = BorrowingDetails),
        (status = 403, description = "Not your borrowing"),
        (status = 404, description = "Borrowing not found"),
        (status = 409, description = "Already returned")
    )
)]
pub async fn return_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<BorrowingDetails>> {
    let borrowing = state.services.equipment.return_borrowing(&current, id).await?;
    Ok(Json(borrowing))
}

/// The current user's borrowings
#[utoipa::path(
    get,
    path = "/borrowings/mine",
    tag = "borrowing",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Borrowings, newest first", body = Vec<BorrowingDetails>)
    )
)]
pub async fn my_borrowings(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
) -> AppResult<Json<Vec<BorrowingDetails>>> {
    let borrowings = state.services.equipment.my_borrowings(&current).await?;
    Ok(Json(borrowings))
}

// ---------------------------------------------------------------------------
// Repairs
// ---------------------------------------------------------------------------

/// Report a problem with equipment
#[utoipa::path(
    post,
    path = "/equipment/{id}/report-issue",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Equipment ID")
    ),
    request_body = CreateRepairRequest,
    responses(
        (status = 201, description = "Repair request filed", body = RepairRequest),
        (status = 404, description = "Equipment not found")
    )
)]
pub async fn report_issue(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CreateRepairRequest>,
) -> AppResult<(StatusCode, Json<RepairRequest>)> {
    request.validate()?;

    let repair = state
        .services
        .equipment
        .report_issue(&current, id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(repair)))
}

/// List repair requests
#[utoipa::path(
    get,
    path = "/repair-requests",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(RepairQuery),
    responses(
        (status = 200, description = "Repair requests, newest first", body = Vec<RepairRequest>),
        (status = 403, description = "Staff privileges required")
    )
)]
pub async fn list_repair_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Query(query): Query<RepairQuery>,
) -> AppResult<Json<Vec<RepairRequest>>> {
    current.require_staff()?;

    let repairs = state.services.equipment.list_repairs(&query).await?;
    Ok(Json(repairs))
}

/// Get a repair request
#[utoipa::path(
    get,
    path = "/repair-requests/{id}",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Repair request ID")
    ),
    responses(
        (status = 200, description = "Repair request", body = RepairRequest),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn get_repair_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<RepairRequest>> {
    current.require_staff()?;

    let repair = state.services.equipment.get_repair(id).await?;
    Ok(Json(repair))
}

/// Update status or notes of a repair request
#[utoipa::path(
    put,
    path = "/repair-requests/{id}",
    tag = "repairs",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Repair request ID")
    ),
    request_body = UpdateRepairRequest,
    responses(
        (status = 200, description = "Repair request updated", body = RepairRequest),
        (status = 404, description = "Repair request not found")
    )
)]
pub async fn update_repair_request(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateRepairRequest>,
) -> AppResult<Json<RepairRequest>> {
    current.require_staff()?;

    let repair = state.services.equipment.update_repair(id, &request).await?;
    Ok(Json(repair))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_borrow_body_may_be_empty() {
        assert!(parse_borrow_body(b"").unwrap().due_date.is_none());
        assert!(parse_borrow_body(b"  \n").unwrap().due_date.is_none());
        assert!(parse_borrow_body(b"{}").unwrap().due_date.is_none());
    }

    #[test]
    fn test_borrow_body_reads_due_date() {
        let request = parse_borrow_body(br#"{"due_date":"2030-01-15T12:00:00Z"}"#).unwrap();
        assert_eq!(
            request.due_date.map(|d| d.to_rfc3339()),
            Some("2030-01-15T12:00:00+00:00".to_string())
        );
    }

    #[test]
    fn test_malformed_borrow_body_is_rejected() {
        for body in [&b"{\"due_date\":\"next friday\"}"[..], b"{not json"] {
            match parse_borrow_body(body) {
                Err(AppError::BadRequest(msg)) => assert!(msg.contains("Invalid borrow request")),
                other => panic!("expected a bad request, got {:?}", other.map(|r| r.due_date)),
            }
        }
    }
}
