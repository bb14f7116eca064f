//! Departments and classes service

use crate::{
    error::{AppError, AppResult},
    models::{
        course::{Class, ClassRequest, ClassStudent},
        department::{Department, DepartmentRequest},
        user::Role,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct DepartmentsService {
    repository: Repository,
}

impl DepartmentsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<Department>> {
        self.repository.departments.list().await
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Department> {
        self.repository.departments.get_by_id(id).await
    }

    pub async fn create(&self, data: &DepartmentRequest) -> AppResult<Department> {
        self.check_head(data.head_id).await?;
        self.repository.departments.create(data).await
    }

    pub async fn update(&self, id: i32, data: &DepartmentRequest) -> AppResult<Department> {
        self.check_head(data.head_id).await?;
        self.repository.departments.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.departments.delete(id).await
    }

    /// A department head is a teacher or a staff member
    async fn check_head(&self, head_id: Option<i32>) -> AppResult<()> {
        let Some(head_id) = head_id else {
            return Ok(());
        };
        match self.repository.users.get_role(head_id).await? {
            Role::Teacher | Role::Staff => Ok(()),
            role => Err(AppError::BusinessRule(format!(
                "A department head must be a teacher or staff member, not {}",
                role
            ))),
        }
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    pub async fn list_classes(&self) -> AppResult<Vec<Class>> {
        self.repository.departments.list_classes().await
    }

    pub async fn get_class(&self, id: i32) -> AppResult<Class> {
        self.repository.departments.get_class(id).await
    }

    pub async fn create_class(&self, data: &ClassRequest) -> AppResult<Class> {
        self.check_advisor(data.advisor_id).await?;
        self.repository.departments.create_class(data).await
    }

    pub async fn update_class(&self, id: i32, data: &ClassRequest) -> AppResult<Class> {
        self.check_advisor(data.advisor_id).await?;
        self.repository.departments.update_class(id, data).await
    }

    pub async fn delete_class(&self, id: i32) -> AppResult<()> {
        self.repository.departments.delete_class(id).await
    }

    pub async fn class_students(&self, id: i32) -> AppResult<Vec<ClassStudent>> {
        self.repository.departments.get_class(id).await?;
        self.repository.users.students_in_class(id).await
    }

    async fn check_advisor(&self, advisor_id: Option<i32>) -> AppResult<()> {
        let Some(advisor_id) = advisor_id else {
            return Ok(());
        };
        if self.repository.users.get_role(advisor_id).await? != Role::Teacher {
            return Err(AppError::BusinessRule(
                "A class advisor must be a teacher".to_string(),
            ));
        }
        Ok(())
    }
}
