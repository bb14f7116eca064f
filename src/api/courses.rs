//! Course and enrollment endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        course::{
            Course, CourseQuery, CourseRequest, CourseSummary, Enrollment, EnrollmentDetails,
            GradeEnrollmentsRequest,
        },
        PageWindow,
    },
};

use super::{AuthenticatedUser, CoursePage, PaginatedResponse};

/// List courses with filters and pagination
#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(CourseQuery),
    responses(
        (status = 200, description = "List of courses", body = CoursePage)
    )
)]
pub async fn list_courses(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Query(query): Query<CourseQuery>,
) -> AppResult<Json<PaginatedResponse<CourseSummary>>> {
    let (courses, total) = state.services.courses.list(&query).await?;
    let window = PageWindow::new(query.page, query.per_page);

    Ok(Json(PaginatedResponse {
        items: courses,
        total,
        page: window.page,
        per_page: window.per_page,
    }))
}

/// Courses taught by the current user
#[utoipa::path(
    get,
    path = "/courses/teaching",
    tag = "courses",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Courses taught", body = Vec<CourseSummary>),
        (status = 403, description = "Teacher role required")
    )
)]
pub async fn my_teaching(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
) -> AppResult<Json<Vec<CourseSummary>>> {
    current.require_teacher()?;

    let courses = state.services.courses.teaching(&current).await?;
    Ok(Json(courses))
}

/// Get course details
#[utoipa::path(
    get,
    path = "/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course details", body = CourseSummary),
        (status = 404, description = "Course not found")
    )
)]
pub async fn get_course(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<CourseSummary>> {
    let course = state.services.courses.get(id).await?;
    Ok(Json(course))
}

/// Create a course taught by the current user
#[utoipa::path(
    post,
    path = "/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    request_body = CourseRequest,
    responses(
        (status = 201, description = "Course created", body = Course),
        (status = 403, description = "Teacher role required"),
        (status = 409, description = "Course code already exists")
    )
)]
pub async fn create_course(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Json(request): Json<CourseRequest>,
) -> AppResult<(StatusCode, Json<Course>)> {
    current.require_teacher()?;
    request.validate()?;

    let course = state.services.courses.create(&current, &request).await?;
    Ok((StatusCode::CREATED, Json(course)))
}

/// Update a course
#[utoipa::path(
    put,
    path = "/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Course updated", body = Course),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn update_course(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<CourseRequest>,
) -> AppResult<Json<Course>> {
    request.validate()?;

    let course = state.services.courses.update(&current, id, &request).await?;
    Ok(Json(course))
}

/// Delete a course
#[utoipa::path(
    delete,
    path = "/courses/{id}",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Course not found")
    )
)]
pub async fn delete_course(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.courses.delete(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Enroll the current student in a course
#[utoipa::path(
    post,
    path = "/courses/{id}/enroll",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 201, description = "Enrolled", body = Enrollment),
        (status = 403, description = "Only students can enroll"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Already enrolled")
    )
)]
pub async fn enroll(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<(StatusCode, Json<Enrollment>)> {
    current.require_student()?;

    let enrollment = state.services.courses.enroll(&current, id).await?;
    Ok((StatusCode::CREATED, Json(enrollment)))
}

/// Drop an enrollment
#[utoipa::path(
    delete,
    path = "/enrollments/{id}",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Enrollment ID")
    ),
    responses(
        (status = 204, description = "Enrollment dropped"),
        (status = 403, description = "Not your enrollment"),
        (status = 404, description = "Enrollment not found")
    )
)]
pub async fn drop_enrollment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.courses.drop_enrollment(&current, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The current student's enrollments
#[utoipa::path(
    get,
    path = "/enrollments/mine",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Enrollments with grades", body = Vec<EnrollmentDetails>)
    )
)]
pub async fn my_enrollments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
) -> AppResult<Json<Vec<EnrollmentDetails>>> {
    let enrollments = state.services.courses.my_enrollments(&current).await?;
    Ok(Json(enrollments))
}

/// Students enrolled in a course
#[utoipa::path(
    get,
    path = "/courses/{id}/roster",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course roster", body = Vec<EnrollmentDetails>),
        (status = 403, description = "Not the instructor or staff")
    )
)]
pub async fn roster(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<EnrollmentDetails>>> {
    let roster = state.services.courses.roster(&current, id).await?;
    Ok(Json(roster))
}

/// Set grades for several enrollments at once
#[utoipa::path(
    put,
    path = "/courses/{id}/grades",
    tag = "enrollments",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = GradeEnrollmentsRequest,
    responses(
        (status = 200, description = "Updated roster", body = Vec<EnrollmentDetails>),
        (status = 400, description = "Invalid grade"),
        (status = 403, description = "Not the course instructor"),
        (status = 404, description = "Enrollment not in this course")
    )
)]
pub async fn grade_enrollments(
    State(state): State<crate::AppState>,
    AuthenticatedUser(current): AuthenticatedUser,
    Path(id): Path<i32>,
    Json(request): Json<GradeEnrollmentsRequest>,
) -> AppResult<Json<Vec<EnrollmentDetails>>> {
    let roster = state.services.courses.grade(&current, id, request).await?;
    Ok(Json(roster))
}
