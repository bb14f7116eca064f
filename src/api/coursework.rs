//! Course materials, assignments and submissions endpoints

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::coursework::{
        sanitize_filename, Assignment, AssignmentRequest, CourseMaterial, GradeSubmissionRequest,
        Submission, SubmissionDetails, SubmitRequest,
    },
    services::coursework::UploadedFile,
};

use super::AuthenticatedUser;

/// Multipart form accepted by the material upload endpoint
#[derive(ToSchema)]
pub struct MaterialUploadForm {
    pub title: String,
    pub description: Option<String>,
    #[schema(format = Binary)]
    pub file: String,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid multipart body: {}", e))
}

/// Collect the `title`, `description` and `file` parts of an upload
async fn read_upload(mut multipart: Multipart) -> AppResult<UploadedFile> {
    let mut title = None;
    let mut description = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => title = Some(field.text().await.map_err(multipart_error)?),
            "description" => {
                let text = field.text().await.map_err(multipart_error)?;
                description = Some(text).filter(|t| !t.trim().is_empty());
            }
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, content_type, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::Validation("file: is required".to_string()))?;

    Ok(UploadedFile {
        title: title.unwrap_or_default(),
        description,
        filename,
        content_type,
        bytes,
    })
}

/// List a course's materials
#[utoipa::path(
    get,
    path = "/courses/{id}/materials",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course materials", body = Vec<CourseMaterial>),
        (status = 404, description = "Course not found")
    )
)]
pub async fn list_materials(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<CourseMaterial>>> {
    let materials = state.services.coursework.list_materials(id).await?;
    Ok(Json(materials))
}

/// Upload a material file (multipart: `title`, `description`, `file`)
#[utoipa::path(
    post,
    path = "/courses/{id}/materials",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body(content = MaterialUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Material uploaded", body = CourseMaterial),
        (status = 400, description = "Missing title or file, or file too large"),
        (status = 403, description = "Not the course instructor")
    )
)]
pub async fn upload_material(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<CourseMaterial>)> {
    let upload = read_upload(multipart).await?;

    let material = state
        .services
        .coursework
        .upload_material(&current, id, upload)
        .await?;
    Ok((StatusCode::CREATED, Json(material)))
}

/// Download a material file
#[utoipa::path(
    get,
    path = "/materials/{id}",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Material not found")
    )
)]
pub async fn download_material(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let (material, bytes) = state.services.coursework.read_material(id).await?;

    let content_type = material
        .content_type
        .clone()
        .unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_filename(&material.original_filename)
    );

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

/// Delete a material and its file
#[utoipa::path(
    delete,
    path = "/materials/{id}",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Material ID")
    ),
    responses(
        (status = 204, description = "Material deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Material not found")
    )
)]
pub async fn delete_material(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.coursework.delete_material(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List a course's assignments
#[utoipa::path(
    get,
    path = "/courses/{id}/assignments",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Assignments ordered by due date", body = Vec<Assignment>),
        (status = 404, description = "Course not found")
    )
)]
pub async fn list_assignments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<Assignment>>> {
    let assignments = state.services.coursework.list_assignments(id).await?;
    Ok(Json(assignments))
}

/// Create an assignment
#[utoipa::path(
    post,
    path = "/courses/{id}/assignments",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = AssignmentRequest,
    responses(
        (status = 201, description = "Assignment created", body = Assignment),
        (status = 403, description = "Not the course instructor")
    )
)]
pub async fn create_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AssignmentRequest>,
) -> AppResult<(StatusCode, Json<Assignment>)> {
    request.validate()?;

    let assignment = state
        .services
        .coursework
        .create_assignment(&current, id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

/// Get an assignment
#[utoipa::path(
    get,
    path = "/assignments/{id}",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Assignment", body = Assignment),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn get_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Assignment>> {
    let assignment = state.services.coursework.get_assignment(id).await?;
    Ok(Json(assignment))
}

/// Update an assignment
#[utoipa::path(
    put,
    path = "/assignments/{id}",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Assignment ID")
    ),
    request_body = AssignmentRequest,
    responses(
        (status = 200, description = "Assignment updated", body = Assignment),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn update_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<AssignmentRequest>,
) -> AppResult<Json<Assignment>> {
    request.validate()?;

    let assignment = state
        .services
        .coursework
        .update_assignment(&current, id, &request)
        .await?;
    Ok(Json(assignment))
}

/// Delete an assignment
#[utoipa::path(
    delete,
    path = "/assignments/{id}",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Assignment ID")
    ),
    responses(
        (status = 204, description = "Assignment deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn delete_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.coursework.delete_assignment(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Submit or resubmit work for an assignment
#[utoipa::path(
    post,
    path = "/assignments/{id}/submit",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Assignment ID")
    ),
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission stored", body = Submission),
        (status = 403, description = "Not a student enrolled in the course"),
        (status = 404, description = "Assignment not found")
    )
)]
pub async fn submit_assignment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<SubmitRequest>,
) -> AppResult<Json<Submission>> {
    current.require_student()?;
    request.validate()?;

    let submission = state.services.coursework.submit(&current, id, &request).await?;
    Ok(Json(submission))
}

/// List submissions for an assignment
#[utoipa::path(
    get,
    path = "/assignments/{id}/submissions",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Assignment ID")
    ),
    responses(
        (status = 200, description = "Submissions with lateness", body = Vec<SubmissionDetails>),
        (status = 403, description = "Not the course instructor")
    )
)]
pub async fn list_submissions(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<SubmissionDetails>>> {
    let submissions = state.services.coursework.list_submissions(&current, id).await?;
    Ok(Json(submissions))
}

/// Score a submission
#[utoipa::path(
    put,
    path = "/submissions/{id}/grade",
    tag = "coursework",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Submission ID")
    ),
    request_body = GradeSubmissionRequest,
    responses(
        (status = 200, description = "Submission graded", body = Submission),
        (status = 400, description = "Score out of range"),
        (status = 403, description = "Not the course instructor")
    )
)]
pub async fn grade_submission(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<GradeSubmissionRequest>,
) -> AppResult<Json<Submission>> {
    let submission = state
        .services
        .coursework
        .grade_submission(&current, id, &request)
        .await?;
    Ok(Json(submission))
}
