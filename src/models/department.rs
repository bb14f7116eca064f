//! Departments and the per-role user profiles

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Academic or administrative department
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Department head (a teacher or staff member)
    pub head_id: Option<i32>,
}

/// Create or replace a department
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DepartmentRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    pub description: Option<String>,
    pub head_id: Option<i32>,
}

/// Student-specific data, one per student user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct StudentProfile {
    pub user_id: i32,
    pub student_id_number: String,
    pub enrollment_date: NaiveDate,
    pub assigned_class_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StudentProfileRequest {
    #[validate(length(min = 1, max = 20, message = "Student ID must be 1-20 characters"))]
    pub student_id_number: String,
    pub enrollment_date: NaiveDate,
    pub assigned_class_id: Option<i32>,
}

/// Employee data for teachers and other staff
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EmployeeProfile {
    pub user_id: i32,
    pub employee_id_number: String,
    pub department_id: Option<i32>,
    pub date_joined: NaiveDate,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EmployeeProfileRequest {
    #[validate(length(min = 1, max = 20, message = "Employee ID must be 1-20 characters"))]
    pub employee_id_number: String,
    pub department_id: Option<i32>,
    /// Defaults to today
    pub date_joined: Option<NaiveDate>,
}
