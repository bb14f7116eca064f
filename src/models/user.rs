//! User model, roles and the authenticated-user guard

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::department::{EmployeeProfile, StudentProfile};
use super::impl_text_column;
use crate::error::AppError;

/// User role gating feature access
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Teacher,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }

    /// Whether users with this role get the `is_staff` flag
    pub fn grants_staff_flag(&self) -> bool {
        !matches!(self, Role::Student)
    }

    /// Whether users with this role get the `is_superuser` flag
    pub fn grants_superuser_flag(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl_text_column!(Role);

/// Full user model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// Hashed password (argon2)
    #[serde(skip_serializing, default)]
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User together with whichever profiles exist
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UserDetails {
    pub user: User,
    pub student_profile: Option<StudentProfile>,
    pub employee_profile: Option<EmployeeProfile>,
}

/// User query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Matches username, first name or last name
    pub q: Option<String>,
    pub role: Option<Role>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create user request (admin)
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Option<Role>,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Self-service registration; always creates a student
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl From<SignupRequest> for CreateUser {
    fn from(req: SignupRequest) -> Self {
        CreateUser {
            username: req.username,
            email: req.email,
            password: req.password,
            first_name: req.first_name,
            last_name: req.last_name,
            role: Some(Role::Student),
            phone_number: None,
            date_of_birth: None,
        }
    }
}

/// Update user request (admin); absent fields are left untouched
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Option<Role>,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The user behind the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub role: Role,
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }

    /// Staff members and administrators
    pub fn is_staff_or_admin(&self) -> bool {
        matches!(self.role, Role::Staff | Role::Admin)
    }

    /// Require one of the given roles; administrators always pass
    pub fn require_any(&self, roles: &[Role]) -> Result<(), AppError> {
        if self.is_admin() || roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "This action requires one of the roles: {}",
                roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
            )))
        }
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Admin])
    }

    pub fn require_staff(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Staff])
    }

    pub fn require_teacher(&self) -> Result<(), AppError> {
        self.require_any(&[Role::Teacher])
    }

    /// Enrolling and submitting work are student-only, even for administrators
    pub fn require_student(&self) -> Result<(), AppError> {
        if self.is_student() {
            Ok(())
        } else {
            Err(AppError::Authorization("Only students can perform this action".to_string()))
        }
    }

    /// Course instructors and administrators manage a course
    pub fn can_manage_course(&self, instructor_id: Option<i32>) -> bool {
        self.is_admin() || instructor_id == Some(self.id)
    }

    pub fn require_course_manager(&self, instructor_id: Option<i32>) -> Result<(), AppError> {
        if self.can_manage_course(instructor_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only the course instructor can manage this course".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, role: Role) -> CurrentUser {
        CurrentUser {
            id,
            username: format!("user{}", id),
            role,
        }
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!(" staff ".parse::<Role>(), Ok(Role::Staff));
        assert!("janitor".parse::<Role>().is_err());
        assert_eq!(Role::Admin.to_string(), "admin");
        assert_eq!(Role::default(), Role::Student);
    }

    #[test]
    fn test_role_flags() {
        assert!(!Role::Student.grants_staff_flag());
        assert!(Role::Teacher.grants_staff_flag());
        assert!(Role::Staff.grants_staff_flag());
        assert!(!Role::Staff.grants_superuser_flag());
        assert!(Role::Admin.grants_superuser_flag());
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Staff).unwrap(), "\"staff\"");
        let role: Role = serde_json::from_str("\"teacher\"").unwrap();
        assert_eq!(role, Role::Teacher);
    }

    #[test]
    fn test_admin_passes_role_guards() {
        let admin = user(1, Role::Admin);
        assert!(admin.require_staff().is_ok());
        assert!(admin.require_teacher().is_ok());
        assert!(admin.can_manage_course(Some(99)));
    }

    #[test]
    fn test_role_guards_reject_other_roles() {
        let student = user(2, Role::Student);
        assert!(matches!(student.require_staff(), Err(AppError::Authorization(_))));
        assert!(student.require_teacher().is_err());
        assert!(student.require_student().is_ok());

        let teacher = user(3, Role::Teacher);
        assert!(teacher.require_staff().is_err());
        assert!(teacher.require_student().is_err());
    }

    #[test]
    fn test_only_students_enroll() {
        assert!(user(1, Role::Admin).require_student().is_err());
        assert!(user(1, Role::Staff).require_student().is_err());
    }

    #[test]
    fn test_course_manager() {
        let teacher = user(5, Role::Teacher);
        assert!(teacher.can_manage_course(Some(5)));
        assert!(!teacher.can_manage_course(Some(6)));
        assert!(!teacher.can_manage_course(None));
        assert!(teacher.require_course_manager(Some(6)).is_err());
    }

    #[test]
    fn test_signup_creates_student() {
        let req = SignupRequest {
            username: "alice".into(),
            email: "alice@example.edu".into(),
            password: "correct horse".into(),
            first_name: "Alice".into(),
            last_name: String::new(),
        };
        let create: CreateUser = req.into();
        assert_eq!(create.role, Some(Role::Student));
    }

    #[test]
    fn test_signup_validation() {
        let req = SignupRequest {
            username: "al".into(),
            email: "not-an-email".into(),
            password: "short".into(),
            first_name: String::new(),
            last_name: String::new(),
        };
        let errors = req.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("password"));
    }
}
