//! Repository layer for database operations
//!
//! Read paths run on the pool. Mutation paths take the caller's
//! transaction connection so a whole workflow commits or rolls back at once.

pub mod loans;
pub mod materials;
pub mod notifications;
pub mod requests;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub materials: materials::MaterialsRepository,
    pub loans: loans::LoansRepository,
    pub requests: requests::RequestsRepository,
    pub notifications: notifications::NotificationsRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            materials: materials::MaterialsRepository::new(pool.clone()),
            loans: loans::LoansRepository::new(pool.clone()),
            requests: requests::RequestsRepository::new(pool.clone()),
            notifications: notifications::NotificationsRepository::new(pool.clone()),
            users: users::UsersRepository,
            pool,
        }
    }

    /// Round-trip to the database
    pub async fn ping(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
