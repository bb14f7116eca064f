//! Repository layer for database operations

pub mod courses;
pub mod coursework;
pub mod departments;
pub mod equipment;
pub mod users;
pub mod venues;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub users: users::UsersRepository,
    pub departments: departments::DepartmentsRepository,
    pub courses: courses::CoursesRepository,
    pub coursework: coursework::CourseworkRepository,
    pub equipment: equipment::EquipmentRepository,
    pub venues: venues::VenuesRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: users::UsersRepository::new(pool.clone()),
            departments: departments::DepartmentsRepository::new(pool.clone()),
            courses: courses::CoursesRepository::new(pool.clone()),
            coursework: coursework::CourseworkRepository::new(pool.clone()),
            equipment: equipment::EquipmentRepository::new(pool.clone()),
            venues: venues::VenuesRepository::new(pool.clone()),
            pool,
        }
    }
}
