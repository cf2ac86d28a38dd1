//! Pending requests repository for database operations

use sqlx::{PgConnection, Pool, Postgres};

use crate::{
    calendar::DateRange,
    error::{AppError, AppResult},
    models::request::{PendingRequest, PendingRequestDetails, RequestKind, RequestStatus},
};

#[derive(Clone)]
pub struct RequestsRepository {
    pool: Pool<Postgres>,
}

impl RequestsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Record a pending request, replacing the existing pending one.
    ///
    /// Maintenance keeps one pending request per material, reservations
    /// one per (material, user); the partial unique indexes enforce it.
    pub async fn upsert_pending(
        &self,
        conn: &mut PgConnection,
        kind: RequestKind,
        material_id: i32,
        user_id: i32,
        range: &DateRange,
    ) -> AppResult<PendingRequest> {
        let conflict_target = match kind {
            RequestKind::Maintenance => "(material_id) WHERE kind = 'maintenance' AND status = 'pending'",
            RequestKind::Reservation => {
                "(material_id, user_id) WHERE kind = 'reservation' AND status = 'pending'"
            }
        };

        let query = format!(
            r#"
            INSERT INTO pending_requests (kind, material_id, user_id, start_date, end_date, status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            ON CONFLICT {}
            DO UPDATE SET user_id = EXCLUDED.user_id,
                          start_date = EXCLUDED.start_date,
                          end_date = EXCLUDED.end_date,
                          created_at = NOW()
            RETURNING *
            "#,
            conflict_target
        );

        let row = sqlx::query_as::<_, PendingRequest>(&query)
            .bind(kind)
            .bind(material_id)
            .bind(user_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_one(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Unlocked read, used to find which material to lock first
    pub async fn get_by_id(&self, id: i32, kind: RequestKind) -> AppResult<PendingRequest> {
        sqlx::query_as::<_, PendingRequest>("SELECT * FROM pending_requests WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(kind)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Demande {} introuvable", id)))
    }

    /// Fetch and row-lock a request of the given kind; callers hold the
    /// material lock already
    pub async fn lock(&self, conn: &mut PgConnection, id: i32, kind: RequestKind) -> AppResult<PendingRequest> {
        sqlx::query_as::<_, PendingRequest>(
            "SELECT * FROM pending_requests WHERE id = $1 AND kind = $2 FOR UPDATE",
        )
        .bind(id)
        .bind(kind)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Demande {} introuvable", id)))
    }

    /// Move a request to its final status
    pub async fn decide(
        &self,
        conn: &mut PgConnection,
        id: i32,
        status: RequestStatus,
    ) -> AppResult<PendingRequest> {
        let row = sqlx::query_as::<_, PendingRequest>(
            r#"
            UPDATE pending_requests SET status = $1, decided_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status)
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Pending requests, oldest first
    pub async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<PendingRequestDetails>> {
        let rows = sqlx::query_as::<_, PendingRequestDetails>(
            r#"
            SELECT p.id, p.kind, p.material_id, m.name AS material_name,
                   p.user_id,
                   COALESCE(NULLIF(TRIM(CONCAT_WS(' ', u.firstname, u.lastname)), ''), u.login) AS requester,
                   p.start_date, p.end_date, p.created_at
            FROM pending_requests p
            JOIN materials m ON m.id = p.material_id
            JOIN users u ON u.id = p.user_id
            WHERE p.status = 'pending' AND ($1::text IS NULL OR p.kind = $1)
            ORDER BY p.created_at, p.id
            "#,
        )
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
