//! Users repository for database operations

use sqlx::PgConnection;

use crate::{
    error::{AppError, AppResult},
    models::user::User,
};

/// Users are managed by the account service; only lookups happen here
#[derive(Clone, Default)]
pub struct UsersRepository;

impl UsersRepository {
    /// Get user by ID
    pub async fn get_by_id(&self, conn: &mut PgConnection, id: i32) -> AppResult<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Utilisateur {} introuvable", id)))
    }
}
