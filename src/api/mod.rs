//! API handlers for CampusHive REST endpoints

pub mod auth;
pub mod classes;
pub mod courses;
pub mod coursework;
pub mod departments;
pub mod equipment;
pub mod health;
pub mod openapi;
pub mod users;
pub mod venues;

use axum::{
    async_trait,
    extract::{DefaultBodyLimit, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    routing::{get, post, put},
    Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::ToSchema;

use crate::{
    error::AppError,
    models::{course::CourseSummary, equipment::Equipment, user::CurrentUser, user::User},
    AppState,
};

/// Paginated response wrapper
#[derive(Serialize, ToSchema)]
#[aliases(
    UserPage = PaginatedResponse<User>,
    CoursePage = PaginatedResponse<CourseSummary>,
    EquipmentPage = PaginatedResponse<Equipment>
)]
pub struct PaginatedResponse<T>
where
    T: for<'a> ToSchema<'a>,
{
    /// List of items
    pub items: Vec<T>,
    /// Total number of items
    pub total: i64,
    /// Current page number
    pub page: i64,
    /// Items per page
    pub per_page: i64,
}

/// Session token from the session cookie or an `Authorization: Bearer` header
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = CookieJar::from_headers(headers).get(cookie_name) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Extractor for the user behind the request's session
pub struct AuthenticatedUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::Authentication("Not logged in".to_string()))?;

        let user = state.services.users.resolve_session(&token).await?;
        Ok(AuthenticatedUser(user))
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let upload_limit = DefaultBodyLimit::max(state.services.coursework.max_upload_bytes() + 64 * 1024);

    let api_v1 = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Users
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).delete(users::delete_user),
        )
        .route("/users/:id/student-profile", put(users::upsert_student_profile))
        .route("/users/:id/employee-profile", put(users::upsert_employee_profile))
        // Departments
        .route(
            "/departments",
            get(departments::list_departments).post(departments::create_department),
        )
        .route(
            "/departments/:id",
            get(departments::get_department)
                .put(departments::update_department)
                .delete(departments::delete_department),
        )
        // Classes
        .route("/classes", get(classes::list_classes).post(classes::create_class))
        .route(
            "/classes/:id",
            get(classes::get_class)
                .put(classes::update_class)
                .delete(classes::delete_class),
        )
        .route("/classes/:id/students", get(classes::list_class_students))
        // Courses
        .route("/courses", get(courses::list_courses).post(courses::create_course))
        .route("/courses/teaching", get(courses::my_teaching))
        .route(
            "/courses/:id",
            get(courses::get_course)
                .put(courses::update_course)
                .delete(courses::delete_course),
        )
        .route("/courses/:id/enroll", post(courses::enroll))
        .route("/courses/:id/roster", get(courses::roster))
        .route("/courses/:id/grades", put(courses::grade_enrollments))
        .route("/enrollments/mine", get(courses::my_enrollments))
        .route("/enrollments/:id", axum::routing::delete(courses::drop_enrollment))
        // Coursework
        .route(
            "/courses/:id/materials",
            get(coursework::list_materials)
                .post(coursework::upload_material)
                .layer(upload_limit),
        )
        .route(
            "/materials/:id",
            get(coursework::download_material).delete(coursework::delete_material),
        )
        .route(
            "/courses/:id/assignments",
            get(coursework::list_assignments).post(coursework::create_assignment),
        )
        .route(
            "/assignments/:id",
            get(coursework::get_assignment)
                .put(coursework::update_assignment)
                .delete(coursework::delete_assignment),
        )
        .route("/assignments/:id/submit", post(coursework::submit_assignment))
        .route("/assignments/:id/submissions", get(coursework::list_submissions))
        .route("/submissions/:id/grade", put(coursework::grade_submission))
        // Equipment
        .route(
            "/equipment-categories",
            get(equipment::list_categories).post(equipment::create_category),
        )
        .route(
            "/equipment-categories/:id",
            put(equipment::update_category).delete(equipment::delete_category),
        )
        .route("/equipment", get(equipment::list_equipment).post(equipment::create_equipment))
        .route(
            "/equipment/:id",
            get(equipment::get_equipment)
                .put(equipment::update_equipment)
                .delete(equipment::delete_equipment),
        )
        .route("/equipment/:id/borrow", post(equipment::borrow_equipment))
        .route("/equipment/:id/report-issue", post(equipment::report_issue))
        .route("/borrowings/mine", get(equipment::my_borrowings))
        .route("/borrowings/:id/return", post(equipment::return_equipment))
        .route("/repair-requests", get(equipment::list_repair_requests))
        .route(
            "/repair-requests/:id",
            get(equipment::get_repair_request).put(equipment::update_repair_request),
        )
        // Venues
        .route("/venues", get(venues::list_venues).post(venues::create_venue))
        .route(
            "/venues/:id",
            get(venues::get_venue).put(venues::update_venue).delete(venues::delete_venue),
        )
        .route("/bookings", get(venues::list_bookings).post(venues::create_booking))
        .route(
            "/bookings/:id",
            get(venues::get_booking)
                .put(venues::update_booking)
                .delete(venues::delete_booking),
        )
        .with_state(state);

    // OpenAPI documentation
    let openapi = openapi::create_openapi_router();

    Router::new()
        .nest("/api/v1", api_v1)
        .merge(openapi)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_session_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::COOKIE,
            HeaderValue::from_static("theme=dark; campushive_session=abc123"),
        );
        assert_eq!(session_token(&headers, "campushive_session").as_deref(), Some("abc123"));
    }

    #[test]
    fn test_session_token_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(session_token(&headers, "campushive_session").as_deref(), Some("tok"));
    }

    #[test]
    fn test_session_token_missing() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers, "campushive_session"), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwYXNz"));
        assert_eq!(session_token(&headers, "campushive_session"), None);
    }
}
