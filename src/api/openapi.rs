//! OpenAPI documentation

use axum::Router;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    auth, classes, courses, coursework, departments, equipment, health, users, venues,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "CampusHive API",
        version = "1.0.0",
        description = "Campus management REST API: people, courses, coursework, equipment and venues"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    modifiers(&SecurityAddon),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Auth
        auth::signup,
        auth::login,
        auth::logout,
        auth::me,
        // Users
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        users::upsert_student_profile,
        users::upsert_employee_profile,
        // Departments
        departments::list_departments,
        departments::get_department,
        departments::create_department,
        departments::update_department,
        departments::delete_department,
        // Classes
        classes::list_classes,
        classes::get_class,
        classes::create_class,
        classes::update_class,
        classes::delete_class,
        classes::list_class_students,
        // Courses
        courses::list_courses,
        courses::my_teaching,
        courses::get_course,
        courses::create_course,
        courses::update_course,
        courses::delete_course,
        courses::enroll,
        courses::drop_enrollment,
        courses::my_enrollments,
        courses::roster,
        courses::grade_enrollments,
        // Coursework
        coursework::list_materials,
        coursework::upload_material,
        coursework::download_material,
        coursework::delete_material,
        coursework::list_assignments,
        coursework::create_assignment,
        coursework::get_assignment,
        coursework::update_assignment,
        coursework::delete_assignment,
        coursework::submit_assignment,
        coursework::list_submissions,
        coursework::grade_submission,
        // Equipment
        equipment::list_categories,
        equipment::create_category,
        equipment::update_category,
        equipment::delete_category,
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        equipment::borrow_equipment,
        equipment::return_equipment,
        equipment::my_borrowings,
        equipment::report_issue,
        equipment::list_repair_requests,
        equipment::get_repair_request,
        equipment::update_repair_request,
        // Venues
        venues::list_venues,
        venues::get_venue,
        venues::create_venue,
        venues::update_venue,
        venues::delete_venue,
        venues::list_bookings,
        venues::get_booking,
        venues::create_booking,
        venues::update_booking,
        venues::delete_booking,
    ),
    components(
        schemas(
            // Pages
            super::UserPage,
            super::CoursePage,
            super::EquipmentPage,
            // Auth
            auth::LoginResponse,
            crate::models::user::LoginRequest,
            crate::models::user::SignupRequest,
            // Users
            crate::models::user::Role,
            crate::models::user::User,
            crate::models::user::UserDetails,
            crate::models::user::UserQuery,
            crate::models::user::CreateUser,
            crate::models::user::UpdateUser,
            crate::models::department::StudentProfile,
            crate::models::department::StudentProfileRequest,
            crate::models::department::EmployeeProfile,
            crate::models::department::EmployeeProfileRequest,
            // Departments and classes
            crate::models::department::Department,
            crate::models::department::DepartmentRequest,
            crate::models::course::Class,
            crate::models::course::ClassRequest,
            crate::models::course::ClassStudent,
            // Courses
            crate::models::course::Course,
            crate::models::course::CourseSummary,
            crate::models::course::CourseRequest,
            crate::models::course::Enrollment,
            crate::models::course::EnrollmentDetails,
            crate::models::course::GradeEntry,
            crate::models::course::GradeEnrollmentsRequest,
            // Coursework
            crate::models::coursework::CourseMaterial,
            coursework::MaterialUploadForm,
            crate::models::coursework::Assignment,
            crate::models::coursework::AssignmentRequest,
            crate::models::coursework::Submission,
            crate::models::coursework::SubmissionDetails,
            crate::models::coursework::SubmitRequest,
            crate::models::coursework::GradeSubmissionRequest,
            // Equipment
            crate::models::equipment::EquipmentStatus,
            crate::models::equipment::EquipmentCategory,
            crate::models::equipment::CategoryRequest,
            crate::models::equipment::Equipment,
            crate::models::equipment::EquipmentRequest,
            crate::models::equipment::EquipmentDetail,
            crate::models::equipment::BorrowingRecord,
            crate::models::equipment::BorrowingDetails,
            crate::models::equipment::BorrowRequest,
            crate::models::repair::RepairStatus,
            crate::models::repair::RepairRequest,
            crate::models::repair::CreateRepairRequest,
            crate::models::repair::UpdateRepairRequest,
            // Venues
            crate::models::venue::Venue,
            crate::models::venue::VenueRequest,
            crate::models::venue::VenueBooking,
            crate::models::venue::VenueBookingView,
            crate::models::venue::BookingRequest,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Signup, login and sessions"),
        (name = "users", description = "User and profile management"),
        (name = "departments", description = "Departments"),
        (name = "classes", description = "Student cohorts"),
        (name = "courses", description = "Course catalog"),
        (name = "enrollments", description = "Enrollments and grades"),
        (name = "coursework", description = "Materials, assignments and submissions"),
        (name = "equipment", description = "Equipment inventory"),
        (name = "borrowing", description = "Equipment borrowing"),
        (name = "repairs", description = "Repair requests"),
        (name = "venues", description = "Venues and bookings")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_lists_core_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/courses/{id}/enroll",
            "/equipment/{id}/borrow",
            "/borrowings/{id}/return",
            "/bookings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
