//! Maintenance scheduling workflow

use chrono::NaiveDate;
use sqlx::PgConnection;

use super::{
    display_date, materials::MaterialsService, notifications::NotificationsService,
    refresh_availability, today,
};
use crate::{
    calendar::{plan_adjustment, Adjustment, DateRange},
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanKind, PeriodRequest},
        material::Material,
        notification::Notice,
        request::{
            DecideRequest, Decision, DecisionOutcome, OutcomeStatus, RequestKind, RequestStatus,
            WorkflowOutcome,
        },
        user::RequestContext,
    },
    repository::{loans::LoanFilter, Repository},
};

#[derive(Clone)]
pub struct MaintenanceService {
    repository: Repository,
    materials: MaterialsService,
    notifications: NotificationsService,
}

impl MaintenanceService {
    pub fn new(repository: Repository, materials: MaterialsService, notifications: NotificationsService) -> Self {
        Self { repository, materials, notifications }
    }

    /// Schedule maintenance on a material (technicians and admins).
    ///
    /// Ordinary loans in the way are shortened or cancelled when the caller
    /// is an admin; a technician gets a pending request instead. The whole
    /// operation is one transaction.
    pub async fn schedule(&self, ctx: &RequestContext, request: &PeriodRequest) -> AppResult<WorkflowOutcome> {
        ctx.require_staff()?;
        let (material_id, range) = request.validate()?;
        let today = today();

        let mut tx = self.repository.pool.begin().await?;
        let material = self.repository.materials.lock(&mut tx, material_id).await?;
        self.ensure_no_maintenance(&mut tx, material_id, &range).await?;

        let overlapping = self
            .repository
            .loans
            .overlapping(&mut tx, material_id, &range, LoanFilter::Ordinary)
            .await?;

        if !overlapping.is_empty() && !ctx.is_admin() {
            let pending = self
                .repository
                .requests
                .upsert_pending(&mut tx, RequestKind::Maintenance, material_id, ctx.user_id, &range)
                .await?;
            tx.commit().await?;

            tracing::info!(
                material_id,
                user_id = ctx.user_id,
                request_id = pending.id,
                conflicts = overlapping.len(),
                "Maintenance waiting for admin approval"
            );
            return Ok(WorkflowOutcome::pending(pending.id));
        }

        let (loan, notices) = self
            .apply(&mut tx, &material, ctx.user_id, &range, overlapping, today)
            .await?;
        tx.commit().await?;

        tracing::info!(material_id, loan_id = loan.id, "Maintenance scheduled");
        self.notifications.dispatch(notices).await;

        Ok(WorkflowOutcome::done(self.materials.catalog_entry(material_id).await?))
    }

    /// Approve or reject a pending maintenance request (admin only).
    ///
    /// Approval recomputes conflicts from current data before booking.
    pub async fn decide(&self, ctx: &RequestContext, body: &DecideRequest) -> AppResult<DecisionOutcome> {
        ctx.require_admin()?;
        let today = today();

        // Material first, like schedule(), which upserts this same row
        let material_id = self
            .repository
            .requests
            .get_by_id(body.id, RequestKind::Maintenance)
            .await?
            .material_id;

        let mut tx = self.repository.pool.begin().await?;
        let material = self.repository.materials.lock(&mut tx, material_id).await?;
        let request = self
            .repository
            .requests
            .lock(&mut tx, body.id, RequestKind::Maintenance)
            .await?;
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict("Demande déjà traitée".to_string()));
        }

        let range = request.range();
        let mut notices = Vec::new();

        let (status, loan_id) = match body.decision {
            Decision::Approve => {
                self.ensure_no_maintenance(&mut tx, material.id, &range).await?;
                let overlapping = self
                    .repository
                    .loans
                    .overlapping(&mut tx, material.id, &range, LoanFilter::Ordinary)
                    .await?;
                let (loan, adjusted) = self
                    .apply(&mut tx, &material, request.user_id, &range, overlapping, today)
                    .await?;
                notices.extend(adjusted);
                (RequestStatus::Approved, Some(loan.id))
            }
            Decision::Reject => (RequestStatus::Rejected, None),
        };

        let request = self.repository.requests.decide(&mut tx, request.id, status).await?;
        tx.commit().await?;

        tracing::info!(request_id = request.id, status = %request.status, "Maintenance request decided");

        let verdict = match status {
            RequestStatus::Approved => "acceptée",
            _ => "refusée",
        };
        notices.push(Notice::new(
            request.user_id,
            format!(
                "Votre demande de maintenance du {} au {} a été {}.",
                display_date(range.start()),
                display_date(range.end()),
                verdict
            ),
        ));
        self.notifications.dispatch(notices).await;

        Ok(DecisionOutcome {
            status: OutcomeStatus::Ok,
            request,
            loan_id,
        })
    }

    /// Shorten or cancel the ordinary loans blocking a maintenance window.
    ///
    /// Returns the notices for the affected borrowers; they are only sent
    /// once the surrounding transaction commits.
    pub async fn adjust_overlapping_reservations(
        &self,
        conn: &mut PgConnection,
        material: &Material,
        window: &DateRange,
        overlapping: Vec<Loan>,
    ) -> AppResult<Vec<Notice>> {
        let mut notices = Vec::with_capacity(overlapping.len());

        for loan in overlapping {
            match plan_adjustment(&loan.range(), window.start()) {
                Adjustment::Shorten { new_end } => {
                    self.repository.loans.set_end_date(conn, loan.id, new_end).await?;
                    tracing::info!(loan_id = loan.id, %new_end, "Loan shortened for maintenance");
                    notices.push(Notice::new(
                        loan.user_id,
                        format!(
                            "Votre réservation de {} a été écourtée en raison d'une maintenance : \
                             elle se termine désormais le {}.",
                            material.name,
                            display_date(new_end)
                        ),
                    ));
                }
                Adjustment::Cancel => {
                    self.repository.loans.delete(conn, loan.id).await?;
                    tracing::info!(loan_id = loan.id, "Loan cancelled for maintenance");
                    notices.push(Notice::new(
                        loan.user_id,
                        format!(
                            "Votre réservation de {} du {} au {} a été annulée en raison d'une maintenance.",
                            material.name,
                            display_date(loan.start_date),
                            display_date(loan.end_date)
                        ),
                    ));
                }
            }
        }

        Ok(notices)
    }

    async fn ensure_no_maintenance(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        range: &DateRange,
    ) -> AppResult<()> {
        if self
            .repository
            .loans
            .has_overlap(conn, material_id, range, LoanFilter::Maintenance)
            .await?
        {
            return Err(AppError::Conflict(
                "Une maintenance est déjà planifiée sur cette période".to_string(),
            ));
        }
        Ok(())
    }

    async fn apply(
        &self,
        conn: &mut PgConnection,
        material: &Material,
        user_id: i32,
        window: &DateRange,
        overlapping: Vec<Loan>,
        today: NaiveDate,
    ) -> AppResult<(Loan, Vec<Notice>)> {
        let notices = self
            .adjust_overlapping_reservations(conn, material, window, overlapping)
            .await?;
        let loan = self
            .repository
            .loans
            .create(conn, material.id, user_id, window, LoanKind::Maintenance)
            .await?;
        refresh_availability(&self.repository, conn, material.id, today).await?;
        Ok((loan, notices))
    }
}
