//! Course materials, assignments and submissions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// An uploaded file attached to a course
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseMaterial {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Path relative to the media directory
    #[serde(skip_serializing, default)]
    pub file_path: String,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: Option<i32>,
    pub uploaded_at: DateTime<Utc>,
}

/// Metadata for a material being stored
#[derive(Debug, Clone)]
pub struct NewCourseMaterial {
    pub course_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub file_path: String,
    pub original_filename: String,
    pub content_type: Option<String>,
    pub size_bytes: i64,
    pub uploaded_by: i32,
}

/// Strip any directory components and unsafe characters from a client filename
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Assignment {
    pub id: i32,
    pub course_id: i32,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub max_score: i32,
    pub created_at: DateTime<Utc>,
}

impl Assignment {
    pub fn is_late(&self, submitted_at: DateTime<Utc>) -> bool {
        submitted_at > self.due_date
    }

    pub fn accepts_score(&self, score: i32) -> bool {
        (0..=self.max_score).contains(&score)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AssignmentRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    #[validate(range(min = 1, message = "Maximum score must be positive"))]
    #[serde(default = "default_max_score")]
    pub max_score: i32,
}

fn default_max_score() -> i32 {
    100
}

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Submission {
    pub id: i32,
    pub assignment_id: i32,
    pub student_id: i32,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

/// Submission with the student's username and lateness
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SubmissionDetails {
    pub id: i32,
    pub assignment_id: i32,
    pub student_id: i32,
    pub student_username: String,
    pub content: String,
    pub submitted_at: DateTime<Utc>,
    pub is_late: bool,
    pub score: Option<i32>,
    pub feedback: Option<String>,
    pub graded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SubmitRequest {
    #[validate(length(min = 1, message = "Submission cannot be empty"))]
    pub content: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GradeSubmissionRequest {
    pub score: i32,
    pub feedback: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn assignment(max_score: i32) -> Assignment {
        let now = Utc::now();
        Assignment {
            id: 1,
            course_id: 1,
            title: "Essay".into(),
            description: String::new(),
            due_date: now,
            max_score,
            created_at: now - Duration::days(7),
        }
    }

    #[test]
    fn test_lateness() {
        let a = assignment(100);
        assert!(!a.is_late(a.due_date - Duration::minutes(1)));
        assert!(!a.is_late(a.due_date));
        assert!(a.is_late(a.due_date + Duration::seconds(1)));
    }

    #[test]
    fn test_score_bounds() {
        let a = assignment(20);
        assert!(a.accepts_score(0));
        assert!(a.accepts_score(20));
        assert!(!a.accepts_score(21));
        assert!(!a.accepts_score(-1));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\Users\\me\\notes week 1.pdf"), "notes_week_1.pdf");
        assert_eq!(sanitize_filename(".hidden"), "hidden");
        assert_eq!(sanitize_filename(""), "upload");
    }
}
