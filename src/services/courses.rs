//! Courses and enrollments service

use crate::{
    error::{AppError, AppResult},
    models::{
        course::{
            Course, CourseQuery, CourseRequest, CourseSummary, Enrollment, EnrollmentDetails,
            GradeEnrollmentsRequest,
        },
        user::CurrentUser,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct CoursesService {
    repository: Repository,
}

impl CoursesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self, query: &CourseQuery) -> AppResult<(Vec<CourseSummary>, i64)> {
        self.repository.courses.list(query).await
    }

    pub async fn get(&self, id: i32) -> AppResult<CourseSummary> {
        self.repository.courses.get_summary(id).await
    }

    /// Load a course the actor is allowed to manage
    pub async fn get_managed(&self, actor: &CurrentUser, id: i32) -> AppResult<Course> {
        let course = self.repository.courses.get_by_id(id).await?;
        actor.require_course_manager(course.instructor_id)?;
        Ok(course)
    }

    /// Create a course taught by the actor
    pub async fn create(&self, actor: &CurrentUser, data: &CourseRequest) -> AppResult<Course> {
        self.check_department(data.department_id).await?;
        let course = self.repository.courses.create(data, actor.id).await?;
        tracing::info!(course_id = course.id, code = %course.code, instructor_id = actor.id, "Course created");
        Ok(course)
    }

    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: i32,
        data: &CourseRequest,
    ) -> AppResult<Course> {
        self.get_managed(actor, id).await?;
        self.check_department(data.department_id).await?;
        self.repository.courses.update(id, data).await
    }

    pub async fn delete(&self, actor: &CurrentUser, id: i32) -> AppResult<()> {
        self.get_managed(actor, id).await?;
        self.repository.courses.delete(id).await
    }

    async fn check_department(&self, department_id: Option<i32>) -> AppResult<()> {
        if let Some(id) = department_id {
            self.repository.departments.get_by_id(id).await?;
        }
        Ok(())
    }

    /// Courses taught by the actor
    pub async fn teaching(&self, actor: &CurrentUser) -> AppResult<Vec<CourseSummary>> {
        self.repository.courses.list_by_instructor(actor.id).await
    }

    // -----------------------------------------------------------------------
    // Enrollments
    // -----------------------------------------------------------------------

    pub async fn enroll(&self, actor: &CurrentUser, course_id: i32) -> AppResult<Enrollment> {
        let course = self.repository.courses.get_by_id(course_id).await?;
        let enrollment = self.repository.courses.enroll(actor.id, course.id).await?;
        tracing::info!(student_id = actor.id, course_id, "Student enrolled");
        Ok(enrollment)
    }

    /// The enrolled student, staff or an administrator may drop an enrollment
    pub async fn drop_enrollment(&self, actor: &CurrentUser, enrollment_id: i32) -> AppResult<()> {
        let enrollment = self.repository.courses.get_enrollment(enrollment_id).await?;
        if enrollment.student_id != actor.id && !actor.is_staff_or_admin() {
            return Err(AppError::Authorization(
                "You can only drop your own enrollments".to_string(),
            ));
        }
        self.repository.courses.delete_enrollment(enrollment_id).await
    }

    pub async fn my_enrollments(&self, actor: &CurrentUser) -> AppResult<Vec<EnrollmentDetails>> {
        self.repository.courses.list_for_student(actor.id).await
    }

    /// Roster for the instructor, staff or administrators
    pub async fn roster(&self, actor: &CurrentUser, course_id: i32) -> AppResult<Vec<EnrollmentDetails>> {
        let course = self.repository.courses.get_by_id(course_id).await?;
        if !actor.can_manage_course(course.instructor_id) && !actor.is_staff_or_admin() {
            return Err(AppError::Authorization(
                "Only the instructor or staff can view the roster".to_string(),
            ));
        }
        self.repository.courses.roster(course_id).await
    }

    /// Set grades in one batch and return the updated roster
    pub async fn grade(
        &self,
        actor: &CurrentUser,
        course_id: i32,
        data: GradeEnrollmentsRequest,
    ) -> AppResult<Vec<EnrollmentDetails>> {
        self.get_managed(actor, course_id).await?;
        let grades = data.normalized().map_err(AppError::Validation)?;
        self.repository.courses.set_grades(course_id, &grades).await?;
        self.repository.courses.roster(course_id).await
    }
}
