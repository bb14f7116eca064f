//! Course materials, assignments and submissions service

use std::path::{Path, PathBuf};

use crate::{
    config::StorageConfig,
    error::{AppError, AppResult},
    models::{
        coursework::{
            sanitize_filename, Assignment, AssignmentRequest, CourseMaterial, GradeSubmissionRequest,
            NewCourseMaterial, Submission, SubmissionDetails, SubmitRequest,
        },
        user::CurrentUser,
    },
    repository::Repository,
};

/// A file received from a multipart upload
#[derive(Debug)]
pub struct UploadedFile {
    pub title: String,
    pub description: Option<String>,
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
pub struct CourseworkService {
    repository: Repository,
    storage: StorageConfig,
}

impl CourseworkService {
    pub fn new(repository: Repository, storage: StorageConfig) -> Self {
        Self { repository, storage }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.storage.max_upload_mb * 1024 * 1024
    }

    fn absolute_path(&self, relative: &str) -> PathBuf {
        Path::new(&self.storage.media_dir).join(relative)
    }

    async fn require_manager(&self, actor: &CurrentUser, course_id: i32) -> AppResult<()> {
        let course = self.repository.courses.get_by_id(course_id).await?;
        actor.require_course_manager(course.instructor_id)
    }

    // -----------------------------------------------------------------------
    // Materials
    // -----------------------------------------------------------------------

    pub async fn list_materials(&self, course_id: i32) -> AppResult<Vec<CourseMaterial>> {
        self.repository.courses.get_by_id(course_id).await?;
        self.repository.coursework.list_materials(course_id).await
    }

    /// Store an uploaded file under the media directory and record it
    pub async fn upload_material(
        &self,
        actor: &CurrentUser,
        course_id: i32,
        file: UploadedFile,
    ) -> AppResult<CourseMaterial> {
        self.require_manager(actor, course_id).await?;

        if file.title.trim().is_empty() {
            return Err(AppError::Validation("title: cannot be empty".to_string()));
        }
        if file.bytes.is_empty() {
            return Err(AppError::Validation("file: cannot be empty".to_string()));
        }
        if file.bytes.len() > self.max_upload_bytes() {
            return Err(AppError::Validation(format!(
                "file: exceeds the {} MB upload limit",
                self.storage.max_upload_mb
            )));
        }

        let relative = format!(
            "course_materials/{}/{}_{}",
            course_id,
            uuid::Uuid::new_v4().simple(),
            sanitize_filename(&file.filename)
        );
        let path = self.absolute_path(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        }
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;

        let record = NewCourseMaterial {
            course_id,
            title: file.title.trim().to_string(),
            description: file.description,
            file_path: relative,
            original_filename: file.filename,
            content_type: file.content_type,
            size_bytes: file.bytes.len() as i64,
            uploaded_by: actor.id,
        };

        match self.repository.coursework.create_material(&record).await {
            Ok(material) => {
                tracing::info!(material_id = material.id, course_id, size = material.size_bytes, "Material uploaded");
                Ok(material)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(e)
            }
        }
    }

    /// Material metadata and its file contents
    pub async fn read_material(&self, id: i32) -> AppResult<(CourseMaterial, Vec<u8>)> {
        let material = self.repository.coursework.get_material(id).await?;
        let bytes = tokio::fs::read(self.absolute_path(&material.file_path))
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    AppError::NotFound(format!("File for material {} is missing", id))
                }
                _ => AppError::Internal(format!("Failed to read material {}: {}", id, e)),
            })?;
        Ok((material, bytes))
    }

    pub async fn delete_material(&self, actor: &CurrentUser, id: i32) -> AppResult<()> {
        let material = self.repository.coursework.get_material(id).await?;
        self.require_manager(actor, material.course_id).await?;

        let deleted = self.repository.coursework.delete_material(id).await?;
        if let Err(e) = tokio::fs::remove_file(self.absolute_path(&deleted.file_path)).await {
            tracing::warn!(material_id = id, "Failed to remove stored file: {}", e);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Assignments
    // -----------------------------------------------------------------------

    pub async fn list_assignments(&self, course_id: i32) -> AppResult<Vec<Assignment>> {
        self.repository.courses.get_by_id(course_id).await?;
        self.repository.coursework.list_assignments(course_id).await
    }

    pub async fn get_assignment(&self, id: i32) -> AppResult<Assignment> {
        self.repository.coursework.get_assignment(id).await
    }

    pub async fn create_assignment(
        &self,
        actor: &CurrentUser,
        course_id: i32,
        data: &AssignmentRequest,
    ) -> AppResult<Assignment> {
        self.require_manager(actor, course_id).await?;
        self.repository.coursework.create_assignment(course_id, data).await
    }

    pub async fn update_assignment(
        &self,
        actor: &CurrentUser,
        id: i32,
        data: &AssignmentRequest,
    ) -> AppResult<Assignment> {
        let assignment = self.repository.coursework.get_assignment(id).await?;
        self.require_manager(actor, assignment.course_id).await?;
        self.repository.coursework.update_assignment(id, data).await
    }

    pub async fn delete_assignment(&self, actor: &CurrentUser, id: i32) -> AppResult<()> {
        let assignment = self.repository.coursework.get_assignment(id).await?;
        self.require_manager(actor, assignment.course_id).await?;
        self.repository.coursework.delete_assignment(id).await
    }

    // -----------------------------------------------------------------------
    // Submissions
    // -----------------------------------------------------------------------

    /// Submit or resubmit work; only students enrolled in the course may
    pub async fn submit(
        &self,
        actor: &CurrentUser,
        assignment_id: i32,
        data: &SubmitRequest,
    ) -> AppResult<Submission> {
        let assignment = self.repository.coursework.get_assignment(assignment_id).await?;
        if !self
            .repository
            .courses
            .is_enrolled(actor.id, assignment.course_id)
            .await?
        {
            return Err(AppError::Authorization(
                "You are not enrolled in this course".to_string(),
            ));
        }

        let submission = self
            .repository
            .coursework
            .upsert_submission(assignment_id, actor.id, &data.content)
            .await?;
        if assignment.is_late(submission.submitted_at) {
            tracing::info!(assignment_id, student_id = actor.id, "Late submission");
        }
        Ok(submission)
    }

    pub async fn list_submissions(
        &self,
        actor: &CurrentUser,
        assignment_id: i32,
    ) -> AppResult<Vec<SubmissionDetails>> {
        let assignment = self.repository.coursework.get_assignment(assignment_id).await?;
        self.require_manager(actor, assignment.course_id).await?;
        self.repository.coursework.list_submissions(assignment_id).await
    }

    pub async fn grade_submission(
        &self,
        actor: &CurrentUser,
        submission_id: i32,
        data: &GradeSubmissionRequest,
    ) -> AppResult<Submission> {
        let submission = self.repository.coursework.get_submission(submission_id).await?;
        let assignment = self
            .repository
            .coursework
            .get_assignment(submission.assignment_id)
            .await?;
        self.require_manager(actor, assignment.course_id).await?;

        if !assignment.accepts_score(data.score) {
            return Err(AppError::Validation(format!(
                "score: must be between 0 and {}",
                assignment.max_score
            )));
        }

        self.repository
            .coursework
            .grade_submission(submission_id, data.score, data.feedback.as_deref())
            .await
    }
}
