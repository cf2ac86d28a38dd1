//! Loans repository for database operations

use chrono::NaiveDate;
use sqlx::{FromRow, PgConnection, Pool, Postgres};

use crate::{
    calendar::DateRange,
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanKind, LoanStats, LoanSummary, ReturnRecord, ReturnState},
        material::Condition,
    },
};

/// A loan counts as active while no return row exists for it
const ACTIVE: &str = "NOT EXISTS (SELECT 1 FROM returns r WHERE r.loan_id = l.id)";

/// Which active loans an overlap query looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanFilter {
    Any,
    Maintenance,
    /// Everything except maintenance
    Ordinary,
}

impl LoanFilter {
    fn clause(&self) -> &'static str {
        match self {
            LoanFilter::Any => "",
            LoanFilter::Maintenance => "AND l.kind = 'Maintenance'",
            LoanFilter::Ordinary => "AND l.kind <> 'Maintenance'",
        }
    }
}

#[derive(FromRow)]
struct LoanSummaryRow {
    id: i32,
    material_id: i32,
    material_name: String,
    material_reference: String,
    user_id: i32,
    login: String,
    firstname: Option<String>,
    lastname: Option<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    kind: LoanKind,
    return_date: Option<NaiveDate>,
    previous_condition: Option<Condition>,
    new_condition: Option<Condition>,
    degraded: Option<bool>,
}

impl LoanSummaryRow {
    fn into_summary(self, today: NaiveDate) -> LoanSummary {
        let return_state = match (self.previous_condition, self.new_condition) {
            (Some(previous_condition), Some(new_condition)) => Some(ReturnState {
                previous_condition,
                new_condition,
                degraded: self.degraded.unwrap_or(false),
            }),
            _ => None,
        };

        let borrower = match (self.firstname, self.lastname) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(name), None) | (None, Some(name)) => name,
            (None, None) => self.login,
        };

        LoanSummary {
            id: self.id,
            material_id: self.material_id,
            material_name: self.material_name,
            material_reference: self.material_reference,
            user_id: self.user_id,
            borrower,
            start_date: self.start_date,
            end_date: self.end_date,
            kind: self.kind,
            overdue: self.return_date.is_none() && self.end_date < today,
            return_date: self.return_date,
            return_state,
        }
    }
}

#[derive(Clone)]
pub struct LoansRepository {
    pool: Pool<Postgres>,
}

impl LoansRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// All active loans, every material
    pub async fn list_active(&self) -> AppResult<Vec<Loan>> {
        let query = format!("SELECT l.* FROM loans l WHERE {} ORDER BY l.start_date, l.id", ACTIVE);
        let rows = sqlx::query_as::<_, Loan>(&query).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    /// Active loans of one material
    pub async fn list_active_for_material(&self, material_id: i32) -> AppResult<Vec<Loan>> {
        let query = format!(
            "SELECT l.* FROM loans l WHERE l.material_id = $1 AND {} ORDER BY l.start_date, l.id",
            ACTIVE
        );
        let rows = sqlx::query_as::<_, Loan>(&query)
            .bind(material_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Unlocked read, used to find which material to lock first
    pub async fn get_by_id(&self, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Emprunt {} introuvable", id)))
    }

    /// Fetch and row-lock a loan; callers hold the material lock already
    pub async fn lock(&self, conn: &mut PgConnection, id: i32) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Emprunt {} introuvable", id)))
    }

    /// Active loans of `material_id` with `start <= range.end AND end >= range.start`
    pub async fn overlapping(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        range: &DateRange,
        filter: LoanFilter,
    ) -> AppResult<Vec<Loan>> {
        let query = format!(
            r#"
            SELECT l.* FROM loans l
            WHERE l.material_id = $1
              AND l.start_date <= $3 AND l.end_date >= $2
              AND {} {}
            ORDER BY l.start_date, l.id
            "#,
            ACTIVE,
            filter.clause()
        );
        let rows = sqlx::query_as::<_, Loan>(&query)
            .bind(material_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    pub async fn has_overlap(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        range: &DateRange,
        filter: LoanFilter,
    ) -> AppResult<bool> {
        let query = format!(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans l
                WHERE l.material_id = $1
                  AND l.start_date <= $3 AND l.end_date >= $2
                  AND {} {}
            )
            "#,
            ACTIVE,
            filter.clause()
        );
        let exists: bool = sqlx::query_scalar(&query)
            .bind(material_id)
            .bind(range.start())
            .bind(range.end())
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// Whether an active loan of the material covers `day`
    pub async fn covers_day(&self, conn: &mut PgConnection, material_id: i32, day: NaiveDate) -> AppResult<bool> {
        let query = format!(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM loans l
                WHERE l.material_id = $1 AND l.start_date <= $2 AND l.end_date >= $2 AND {}
            )
            "#,
            ACTIVE
        );
        let exists: bool = sqlx::query_scalar(&query)
            .bind(material_id)
            .bind(day)
            .fetch_one(&mut *conn)
            .await?;
        Ok(exists)
    }

    /// Late returns plus still-overdue loans of a user, maintenance excluded
    pub async fn count_delays(&self, conn: &mut PgConnection, user_id: i32, today: NaiveDate) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loans l
            LEFT JOIN returns r ON r.loan_id = l.id
            WHERE l.user_id = $1
              AND l.kind <> 'Maintenance'
              AND (
                    (r.loan_id IS NOT NULL AND r.return_date > l.end_date)
                 OR (r.loan_id IS NULL AND l.end_date < $2)
              )
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&mut *conn)
        .await?;
        Ok(count)
    }

    /// Create a loan
    pub async fn create(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        user_id: i32,
        range: &DateRange,
        kind: LoanKind,
    ) -> AppResult<Loan> {
        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (material_id, user_id, start_date, end_date, kind)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(material_id)
        .bind(user_id)
        .bind(range.start())
        .bind(range.end())
        .bind(kind)
        .fetch_one(&mut *conn)
        .await?;
        Ok(loan)
    }

    pub async fn set_end_date(&self, conn: &mut PgConnection, id: i32, end_date: NaiveDate) -> AppResult<()> {
        sqlx::query("UPDATE loans SET end_date = $1 WHERE id = $2")
            .bind(end_date)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn set_kind(&self, conn: &mut PgConnection, id: i32, kind: LoanKind) -> AppResult<()> {
        sqlx::query("UPDATE loans SET kind = $1 WHERE id = $2")
            .bind(kind)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    /// Physically remove a loan together with its return row
    pub async fn delete(&self, conn: &mut PgConnection, id: i32) -> AppResult<()> {
        sqlx::query("DELETE FROM returns WHERE loan_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        sqlx::query("DELETE FROM loans WHERE id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub async fn get_return(&self, conn: &mut PgConnection, loan_id: i32) -> AppResult<Option<ReturnRecord>> {
        let row = sqlx::query_as::<_, ReturnRecord>("SELECT * FROM returns WHERE loan_id = $1")
            .bind(loan_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row)
    }

    /// Close a loan
    pub async fn create_return(
        &self,
        conn: &mut PgConnection,
        loan_id: i32,
        return_date: NaiveDate,
        state: &ReturnState,
    ) -> AppResult<ReturnRecord> {
        let row = sqlx::query_as::<_, ReturnRecord>(
            r#"
            INSERT INTO returns (loan_id, return_date, previous_condition, new_condition, degraded)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(loan_id)
        .bind(return_date)
        .bind(state.previous_condition)
        .bind(state.new_condition)
        .bind(state.degraded)
        .fetch_one(&mut *conn)
        .await?;
        Ok(row)
    }

    /// Loans for the dashboard, optionally restricted to one borrower
    pub async fn list_summaries(&self, user_id: Option<i32>, today: NaiveDate) -> AppResult<Vec<LoanSummary>> {
        let rows = sqlx::query_as::<_, LoanSummaryRow>(
            r#"
            SELECT l.id, l.material_id, m.name AS material_name, m.reference AS material_reference,
                   l.user_id, u.login, u.firstname, u.lastname,
                   l.start_date, l.end_date, l.kind,
                   r.return_date, r.previous_condition, r.new_condition, r.degraded
            FROM loans l
            JOIN materials m ON m.id = l.material_id
            JOIN users u ON u.id = l.user_id
            LEFT JOIN returns r ON r.loan_id = l.id
            WHERE ($1::int IS NULL OR l.user_id = $1)
            ORDER BY l.start_date DESC, l.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.into_summary(today)).collect())
    }

    /// Dashboard counters, optionally restricted to one user
    pub async fn stats(&self, user_id: Option<i32>, today: NaiveDate) -> AppResult<LoanStats> {
        let stats = sqlx::query_as::<_, LoanStats>(
            r#"
            SELECT
                COUNT(l.id) AS total,
                COUNT(l.id) FILTER (WHERE r.loan_id IS NULL) AS active,
                COUNT(l.id) FILTER (WHERE r.loan_id IS NULL AND l.end_date < $2) AS overdue,
                COUNT(r.loan_id) AS returned,
                COUNT(l.id) FILTER (WHERE l.kind = 'Maintenance' AND r.loan_id IS NULL) AS maintenance,
                (
                    SELECT COUNT(*) FROM pending_requests p
                    WHERE p.status = 'pending' AND ($1::int IS NULL OR p.user_id = $1)
                ) AS pending_requests
            FROM loans l
            LEFT JOIN returns r ON r.loan_id = l.id
            WHERE ($1::int IS NULL OR l.user_id = $1)
            "#,
        )
        .bind(user_id)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
