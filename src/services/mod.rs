//! Business logic services

pub mod courses;
pub mod coursework;
pub mod departments;
pub mod equipment;
pub mod import;
pub mod redis;
pub mod users;
pub mod venues;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub users: users::UsersService,
    pub departments: departments::DepartmentsService,
    pub courses: courses::CoursesService,
    pub coursework: coursework::CourseworkService,
    pub equipment: equipment::EquipmentService,
    pub venues: venues::VenuesService,
    pub import: import::ImportService,
    pub redis: redis::RedisService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig, redis_service: redis::RedisService) -> Self {
        Self {
            users: users::UsersService::new(
                repository.clone(),
                config.auth.clone(),
                redis_service.clone(),
            ),
            departments: departments::DepartmentsService::new(repository.clone()),
            courses: courses::CoursesService::new(repository.clone()),
            coursework: coursework::CourseworkService::new(repository.clone(), config.storage.clone()),
            equipment: equipment::EquipmentService::new(repository.clone(), config.borrowing.clone()),
            venues: venues::VenuesService::new(repository.clone()),
            import: import::ImportService::new(repository),
            redis: redis_service,
        }
    }
}
