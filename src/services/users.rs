//! Authentication, sessions and user management service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::{
        department::{EmployeeProfile, EmployeeProfileRequest, StudentProfile, StudentProfileRequest},
        user::{CreateUser, CurrentUser, Role, SignupRequest, UpdateUser, User, UserDetails, UserQuery},
    },
    repository::Repository,
    services::redis::RedisService,
};

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored Argon2 hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct UsersService {
    repository: Repository,
    config: AuthConfig,
    redis: RedisService,
}

impl UsersService {
    pub fn new(repository: Repository, config: AuthConfig, redis: RedisService) -> Self {
        Self { repository, config, redis }
    }

    /// Session lifetime in seconds
    pub fn session_ttl_seconds(&self) -> u64 {
        self.config.session_ttl_hours * 3600
    }

    /// Check credentials and record the login
    pub async fn authenticate(&self, username: &str, password: &str) -> AppResult<User> {
        let user = self
            .repository
            .users
            .get_by_username(username.trim())
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid username or password".to_string()))?;

        if !verify_password(&user.password, password)? {
            return Err(AppError::Authentication("Invalid username or password".to_string()));
        }

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        self.repository.users.touch_last_login(user.id).await?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(user)
    }

    /// Self-service registration, always as a student
    pub async fn signup(&self, data: SignupRequest) -> AppResult<User> {
        self.create_user(data.into()).await
    }

    pub async fn open_session(&self, user_id: i32) -> AppResult<String> {
        self.redis.create_session(user_id, self.session_ttl_seconds()).await
    }

    pub async fn close_session(&self, token: &str) -> AppResult<()> {
        self.redis.delete_session(token).await
    }

    /// Resolve a session token to an active user
    pub async fn resolve_session(&self, token: &str) -> AppResult<CurrentUser> {
        let user_id = self
            .redis
            .get_session(token)
            .await?
            .ok_or_else(|| AppError::Authentication("Session expired or invalid".to_string()))?;

        let user = match self.repository.users.get_by_id(user_id).await {
            Ok(user) => user,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Authentication("Session expired or invalid".to_string()))
            }
            Err(e) => return Err(e),
        };

        if !user.is_active {
            return Err(AppError::Authentication("Account is disabled".to_string()));
        }

        Ok(CurrentUser::from(&user))
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.repository.users.get_by_id(id).await
    }

    /// User with whichever profiles exist
    pub async fn get_details(&self, id: i32) -> AppResult<UserDetails> {
        let user = self.repository.users.get_by_id(id).await?;
        let student_profile = self.repository.users.get_student_profile(id).await?;
        let employee_profile = self.repository.users.get_employee_profile(id).await?;
        Ok(UserDetails {
            user,
            student_profile,
            employee_profile,
        })
    }

    pub async fn search_users(&self, query: &UserQuery) -> AppResult<(Vec<User>, i64)> {
        self.repository.users.search(query).await
    }

    /// Create a new user
    pub async fn create_user(&self, user: CreateUser) -> AppResult<User> {
        if self.repository.users.username_exists(&user.username, None).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let password_hash = hash_password(&user.password)?;
        let created = self.repository.users.create(&user, &password_hash).await?;
        tracing::info!(user_id = created.id, role = %created.role, "User created");
        Ok(created)
    }

    /// Update a user; a new password is hashed before storing
    pub async fn update_user(&self, id: i32, data: UpdateUser) -> AppResult<User> {
        if let Some(ref username) = data.username {
            if self.repository.users.username_exists(username, Some(id)).await? {
                return Err(AppError::Conflict("Username already exists".to_string()));
            }
        }

        let password_hash = data.password.as_deref().map(hash_password).transpose()?;
        self.repository
            .users
            .update(id, &data, password_hash.as_deref())
            .await
    }

    pub async fn delete_user(&self, id: i32, actor: &CurrentUser) -> AppResult<()> {
        if id == actor.id {
            return Err(AppError::BusinessRule("You cannot delete your own account".to_string()));
        }
        self.repository.users.delete(id).await
    }

    /// Student profiles belong to students only
    pub async fn upsert_student_profile(
        &self,
        user_id: i32,
        data: &StudentProfileRequest,
    ) -> AppResult<StudentProfile> {
        let role = self.repository.users.get_role(user_id).await?;
        if role != Role::Student {
            return Err(AppError::BusinessRule(
                "Student profiles can only be attached to students".to_string(),
            ));
        }
        if let Some(class_id) = data.assigned_class_id {
            self.repository.departments.get_class(class_id).await?;
        }
        self.repository.users.upsert_student_profile(user_id, data).await
    }

    /// Employee profiles belong to teachers, staff and administrators
    pub async fn upsert_employee_profile(
        &self,
        user_id: i32,
        data: &EmployeeProfileRequest,
    ) -> AppResult<EmployeeProfile> {
        let role = self.repository.users.get_role(user_id).await?;
        if role == Role::Student {
            return Err(AppError::BusinessRule(
                "Students cannot have an employee profile".to_string(),
            ));
        }
        if let Some(department_id) = data.department_id {
            self.repository.departments.get_by_id(department_id).await?;
        }
        self.repository.users.upsert_employee_profile(user_id, data).await
    }
}
