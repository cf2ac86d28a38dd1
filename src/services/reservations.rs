//! Reservation workflow

use chrono::NaiveDate;
use sqlx::PgConnection;

use super::{
    display_date, materials::MaterialsService, notifications::NotificationsService,
    refresh_availability, today,
};
use crate::{
    calendar::DateRange,
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{
        loan::{Loan, LoanKind, PeriodRequest},
        notification::Notice,
        request::{
            DecideRequest, Decision, DecisionOutcome, OutcomeStatus, RequestKind, RequestStatus,
            WorkflowOutcome,
        },
        user::{RequestContext, Role},
    },
    repository::{loans::LoanFilter, Repository},
};

#[derive(Clone)]
pub struct ReservationsService {
    repository: Repository,
    lending: LendingConfig,
    materials: MaterialsService,
    notifications: NotificationsService,
}

impl ReservationsService {
    pub fn new(
        repository: Repository,
        lending: LendingConfig,
        materials: MaterialsService,
        notifications: NotificationsService,
    ) -> Self {
        Self { repository, lending, materials, notifications }
    }

    /// Reserve a material for the caller.
    ///
    /// Users with too many past delays get a pending request instead of a
    /// loan; an admin decides later through [`Self::decide`].
    pub async fn reserve(&self, ctx: &RequestContext, request: &PeriodRequest) -> AppResult<WorkflowOutcome> {
        let (material_id, range) = request.validate()?;
        check_duration(ctx.role, &range, &self.lending)?;
        let today = today();

        let mut tx = self.repository.pool.begin().await?;
        self.repository.materials.lock(&mut tx, material_id).await?;
        self.ensure_bookable(&mut tx, material_id, &range, today).await?;

        if !ctx.role.is_staff() {
            let delays = self.repository.loans.count_delays(&mut tx, ctx.user_id, today).await?;
            if needs_approval(ctx.role, delays, &self.lending) {
                let pending = self
                    .repository
                    .requests
                    .upsert_pending(&mut tx, RequestKind::Reservation, material_id, ctx.user_id, &range)
                    .await?;
                tx.commit().await?;

                tracing::info!(
                    material_id,
                    user_id = ctx.user_id,
                    request_id = pending.id,
                    delays,
                    "Reservation escalated to admin approval"
                );
                return Ok(WorkflowOutcome::pending(pending.id));
            }
        }

        let loan = self.book(&mut tx, material_id, ctx.user_id, &range, today).await?;
        tx.commit().await?;

        tracing::info!(material_id, user_id = ctx.user_id, loan_id = loan.id, "Reservation created");
        Ok(WorkflowOutcome::done(self.materials.catalog_entry(material_id).await?))
    }

    /// Approve or reject a pending reservation request (admin only).
    ///
    /// Approval re-validates against the current bookings, not the state
    /// seen when the request was filed.
    pub async fn decide(&self, ctx: &RequestContext, body: &DecideRequest) -> AppResult<DecisionOutcome> {
        ctx.require_admin()?;
        let today = today();

        // Material first, like reserve(), which upserts this same row
        let material_id = self
            .repository
            .requests
            .get_by_id(body.id, RequestKind::Reservation)
            .await?
            .material_id;

        let mut tx = self.repository.pool.begin().await?;
        let material = self.repository.materials.lock(&mut tx, material_id).await?;
        let request = self
            .repository
            .requests
            .lock(&mut tx, body.id, RequestKind::Reservation)
            .await?;
        if request.status != RequestStatus::Pending {
            return Err(AppError::Conflict("Demande déjà traitée".to_string()));
        }

        let range = request.range();

        let (status, loan_id) = match body.decision {
            Decision::Approve => {
                let requester = self.repository.users.get_by_id(&mut tx, request.user_id).await?;
                check_duration(requester.role, &range, &self.lending)?;
                self.ensure_bookable(&mut tx, material.id, &range, today).await?;
                let loan = self.book(&mut tx, material.id, requester.id, &range, today).await?;
                (RequestStatus::Approved, Some(loan.id))
            }
            Decision::Reject => (RequestStatus::Rejected, None),
        };

        let request = self.repository.requests.decide(&mut tx, request.id, status).await?;
        tx.commit().await?;

        tracing::info!(request_id = request.id, status = %request.status, "Reservation request decided");

        let verdict = match status {
            RequestStatus::Approved => "acceptée",
            _ => "refusée",
        };
        self.notifications
            .dispatch(vec![Notice::new(
                request.user_id,
                format!(
                    "Votre demande de réservation de {} du {} au {} a été {}.",
                    material.name,
                    display_date(range.start()),
                    display_date(range.end()),
                    verdict
                ),
            )])
            .await;

        Ok(DecisionOutcome {
            status: OutcomeStatus::Ok,
            request,
            loan_id,
        })
    }

    /// Free of any active booking and not in the past
    async fn ensure_bookable(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        range: &DateRange,
        today: NaiveDate,
    ) -> AppResult<()> {
        if self
            .repository
            .loans
            .has_overlap(conn, material_id, range, LoanFilter::Any)
            .await?
        {
            return Err(AppError::Conflict("Déjà réservé sur cette période".to_string()));
        }
        if range.starts_before(today) {
            return Err(AppError::Validation(
                "Impossible de réserver une période passée".to_string(),
            ));
        }
        Ok(())
    }

    async fn book(
        &self,
        conn: &mut PgConnection,
        material_id: i32,
        user_id: i32,
        range: &DateRange,
        today: NaiveDate,
    ) -> AppResult<Loan> {
        let loan = self
            .repository
            .loans
            .create(conn, material_id, user_id, range, LoanKind::Ongoing)
            .await?;
        if range.contains(today) {
            refresh_availability(&self.repository, conn, material_id, today).await?;
        }
        Ok(loan)
    }
}

/// Inclusive length cap; applies to every role
pub(crate) fn check_duration(role: Role, range: &DateRange, lending: &LendingConfig) -> AppResult<()> {
    let max_days = role.max_loan_days(lending);
    if range.days() > max_days {
        return Err(AppError::Validation(format!(
            "Durée maximale de réservation dépassée ({} jours)",
            max_days
        )));
    }
    Ok(())
}

/// Too many past delays send non-staff reservations to an admin
pub(crate) fn needs_approval(role: Role, delays: i64, lending: &LendingConfig) -> bool {
    !role.is_staff() && delays >= lending.delay_escalation_threshold
}
