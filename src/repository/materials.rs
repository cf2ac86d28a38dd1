//! Materials repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::material::{Condition, CreateMaterial, Material},
};

#[derive(Clone)]
pub struct MaterialsRepository {
    pool: Pool<Postgres>,
}

impl MaterialsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all materials
    pub async fn list(&self) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, Material>("SELECT * FROM materials ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Get material by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Material> {
        sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Fetch and row-lock a material for the rest of the transaction.
    ///
    /// Every booking workflow goes through this first, so overlap checks
    /// and inserts on one material are serialized.
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Material> {
        sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn set_available(&self, conn: &mut PgConnection, id: i32, available: bool) -> AppResult<()> {
        sqlx::query("UPDATE materials SET available = $1 WHERE id = $2")
            .bind(available)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn set_condition(&self, conn: &mut PgConnection, id: i32, condition: Condition) -> AppResult<()> {
        sqlx::query("UPDATE materials SET condition = $1 WHERE id = $2")
            .bind(condition)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Serialize reference allocation for one prefix until commit
    pub async fn lock_reference_prefix(&self, conn: &mut PgConnection, prefix: &str) -> AppResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(prefix)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// References of the form `PREFIX-...`
    pub async fn references_with_prefix(&self, conn: &mut PgConnection, prefix: &str) -> AppResult<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT reference FROM materials WHERE reference LIKE $1 || '-%'",
        )
        .bind(prefix)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    /// Create material
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        data: &CreateMaterial,
        reference: &str,
    ) -> AppResult<Material> {
        let row = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (name, categories, location, condition, available, reference, picture)
            VALUES ($1, $2, $3, $4, TRUE, $5, $6)
            RETURNING *
            "#,
        )
        .bind(data.name.trim())
        .bind(&data.categories)
        .bind(&data.location)
        .bind(data.condition.unwrap_or(Condition::Bon))
        .bind(reference)
        .bind(&data.picture)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Matériel {} introuvable", id))
}
