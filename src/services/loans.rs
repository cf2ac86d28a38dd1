//! Loan closure, cancellation requests and dashboard

use sqlx::PgConnection;

use super::{refresh_availability, today};
use crate::{
    error::{AppError, AppResult},
    models::{
        loan::{
            CancelLoanRequest, Dashboard, DashboardScope, Loan, LoanKind, ReturnLoanRequest,
            ReturnRecord, ReturnState,
        },
        material::Material,
        user::RequestContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
}

impl LoansService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Close a loan by recording its return (owner or admin).
    ///
    /// A second return on the same loan is a conflict.
    pub async fn return_loan(&self, ctx: &RequestContext, body: &ReturnLoanRequest) -> AppResult<ReturnRecord> {
        let today = today();

        let mut tx = self.repository.pool.begin().await?;
        let (material, loan) = self.lock_loan(&mut tx, body.id).await?;
        ctx.require_owner_or_admin(loan.user_id)?;

        if self.repository.loans.get_return(&mut tx, loan.id).await?.is_some() {
            return Err(AppError::Conflict("Emprunt déjà rendu".to_string()));
        }

        let state = ReturnState::evaluate(loan.kind, material.condition, body.condition)?;

        let record = self
            .repository
            .loans
            .create_return(&mut tx, loan.id, today, &state)
            .await?;
        self.repository
            .materials
            .set_condition(&mut tx, material.id, state.new_condition)
            .await?;
        refresh_availability(&self.repository, &mut tx, material.id, today).await?;
        tx.commit().await?;

        tracing::info!(
            loan_id = loan.id,
            material_id = material.id,
            state = %state.label(),
            "Loan returned"
        );
        Ok(record)
    }

    /// Flag an active loan as awaiting cancellation (owner or admin)
    pub async fn request_cancellation(&self, ctx: &RequestContext, body: &CancelLoanRequest) -> AppResult<Loan> {
        let mut tx = self.repository.pool.begin().await?;
        let (_, mut loan) = self.lock_loan(&mut tx, body.id).await?;
        ctx.require_owner_or_admin(loan.user_id)?;

        if self.repository.loans.get_return(&mut tx, loan.id).await?.is_some() {
            return Err(AppError::Conflict("Emprunt déjà rendu".to_string()));
        }
        if loan.is_maintenance() {
            return Err(AppError::Conflict(
                "Une maintenance ne peut pas faire l'objet d'une annulation".to_string(),
            ));
        }
        if loan.kind == LoanKind::CancellationRequested {
            return Err(AppError::Conflict("Annulation déjà demandée".to_string()));
        }

        self.repository
            .loans
            .set_kind(&mut tx, loan.id, LoanKind::CancellationRequested)
            .await?;
        tx.commit().await?;

        tracing::info!(loan_id = loan.id, user_id = ctx.user_id, "Loan cancellation requested");
        loan.kind = LoanKind::CancellationRequested;
        Ok(loan)
    }

    /// Lock the loan's material, then the loan itself.
    ///
    /// Maintenance rewrites loans while holding the material lock, so the
    /// material always has to be taken first.
    async fn lock_loan(&self, conn: &mut PgConnection, loan_id: i32) -> AppResult<(Material, Loan)> {
        let material_id = self.repository.loans.get_by_id(loan_id).await?.material_id;
        let material = self.repository.materials.lock(conn, material_id).await?;
        let loan = self.repository.loans.lock(conn, loan_id).await?;
        Ok((material, loan))
    }

    /// Loans and counters, for the caller or for everyone (admin)
    pub async fn dashboard(&self, ctx: &RequestContext, scope: DashboardScope) -> AppResult<Dashboard> {
        let user_id = match scope {
            DashboardScope::Mine => Some(ctx.user_id),
            DashboardScope::All => {
                ctx.require_admin()?;
                None
            }
        };
        let today = today();

        let loans = self.repository.loans.list_summaries(user_id, today).await?;
        let stats = self.repository.loans.stats(user_id, today).await?;
        Ok(Dashboard { loans, stats })
    }
}
