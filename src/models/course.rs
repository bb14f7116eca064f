//! Classes, courses and enrollments

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// `2024/2025`
static ACADEMIC_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}/\d{4}$").expect("academic year pattern"));

/// Maximum length of a letter grade such as "A+" or "PASS"
pub const MAX_GRADE_LEN: usize = 5;

// ---------------------------------------------------------------------------
// Class
// ---------------------------------------------------------------------------

/// A cohort of students, e.g. "Grade 10 / Section 1"
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Class {
    pub id: i32,
    pub name: String,
    /// e.g. 2024/2025
    pub academic_year: String,
    /// Class advisor (a teacher)
    pub advisor_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ClassRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(regex(path = *ACADEMIC_YEAR, message = "Academic year must look like 2024/2025"))]
    pub academic_year: String,
    pub advisor_id: Option<i32>,
}

/// Student listed on a class roster
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct ClassStudent {
    pub user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub student_id_number: String,
}

// ---------------------------------------------------------------------------
// Course
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Course {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub description: String,
    pub credits: i16,
    pub department_id: Option<i32>,
    pub instructor_id: Option<i32>,
}

/// Course with display names and enrollment count
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseSummary {
    pub id: i32,
    pub code: String,
    pub title: String,
    pub description: String,
    pub credits: i16,
    pub department_id: Option<i32>,
    pub department_name: Option<String>,
    pub instructor_id: Option<i32>,
    pub instructor_username: Option<String>,
    pub enrollment_count: i64,
}

/// Create or replace a course. The instructor is never taken from the body.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CourseRequest {
    #[validate(length(min = 1, max = 20, message = "Code must be 1-20 characters"))]
    pub code: String,
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[validate(range(min = 0, message = "Credits cannot be negative"))]
    #[serde(default)]
    pub credits: i16,
    pub department_id: Option<i32>,
}

/// Course list filters
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct CourseQuery {
    /// Title contains (case-insensitive)
    pub title: Option<String>,
    /// Code contains (case-insensitive)
    pub code: Option<String>,
    pub department_id: Option<i32>,
    pub instructor_id: Option<i32>,
    pub credits: Option<i16>,
    pub credits_min: Option<i16>,
    pub credits_max: Option<i16>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

// ---------------------------------------------------------------------------
// Enrollment
// ---------------------------------------------------------------------------

/// A student's registration in a course; unique per (student, course)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Enrollment {
    pub id: i32,
    pub student_id: i32,
    pub course_id: i32,
    pub enrollment_date: NaiveDate,
    pub grade: Option<String>,
}

/// Enrollment joined with student and course names, for rosters
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EnrollmentDetails {
    pub id: i32,
    pub student_id: i32,
    pub student_username: String,
    pub student_first_name: String,
    pub student_last_name: String,
    pub course_id: i32,
    pub course_code: String,
    pub course_title: String,
    pub enrollment_date: NaiveDate,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct GradeEntry {
    pub enrollment_id: i32,
    /// `null` clears the grade
    pub grade: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeEnrollmentsRequest {
    pub grades: Vec<GradeEntry>,
}

impl GradeEnrollmentsRequest {
    /// Trim grades, turn blanks into `None` and reject over-long ones
    pub fn normalized(self) -> Result<Vec<GradeEntry>, String> {
        self.grades
            .into_iter()
            .map(|entry| {
                let grade = entry
                    .grade
                    .map(|g| g.trim().to_string())
                    .filter(|g| !g.is_empty());
                match grade {
                    Some(ref g) if g.chars().count() > MAX_GRADE_LEN => Err(format!(
                        "Grade for enrollment {} exceeds {} characters",
                        entry.enrollment_id, MAX_GRADE_LEN
                    )),
                    _ => Ok(GradeEntry {
                        enrollment_id: entry.enrollment_id,
                        grade,
                    }),
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_academic_year_format() {
        let ok = ClassRequest {
            name: "10-A".into(),
            academic_year: "2024/2025".into(),
            advisor_id: None,
        };
        assert!(ok.validate().is_ok());

        let bad = ClassRequest {
            name: "10-A".into(),
            academic_year: "2024-25".into(),
            advisor_id: None,
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_course_credits_not_negative() {
        let req = CourseRequest {
            code: "CS101".into(),
            title: "Intro".into(),
            description: String::new(),
            credits: -1,
            department_id: None,
        };
        assert!(req.validate().unwrap_err().field_errors().contains_key("credits"));
    }

    #[test]
    fn test_grades_normalized() {
        let req = GradeEnrollmentsRequest {
            grades: vec![
                GradeEntry { enrollment_id: 1, grade: Some(" A+ ".into()) },
                GradeEntry { enrollment_id: 2, grade: Some("   ".into()) },
                GradeEntry { enrollment_id: 3, grade: None },
            ],
        };
        let grades = req.normalized().unwrap();
        assert_eq!(grades[0].grade.as_deref(), Some("A+"));
        assert_eq!(grades[1].grade, None);
        assert_eq!(grades[2].grade, None);
    }

    #[test]
    fn test_grade_too_long() {
        let req = GradeEnrollmentsRequest {
            grades: vec![GradeEntry { enrollment_id: 7, grade: Some("EXCELLENT".into()) }],
        };
        assert!(req.normalized().unwrap_err().contains("enrollment 7"));
    }
}
