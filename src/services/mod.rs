//! Business logic services

pub mod loans;
pub mod maintenance;
pub mod materials;
pub mod notifications;
pub mod requests;
pub mod reservations;

use chrono::{Local, NaiveDate};
use sqlx::PgConnection;

use crate::{config::LendingConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub materials: materials::MaterialsService,
    pub reservations: reservations::ReservationsService,
    pub maintenance: maintenance::MaintenanceService,
    pub loans: loans::LoansService,
    pub requests: requests::RequestsService,
    pub notifications: notifications::NotificationsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, lending: LendingConfig) -> Self {
        let materials = materials::MaterialsService::new(repository.clone());
        let notifications = notifications::NotificationsService::new(repository.clone());

        Self {
            reservations: reservations::ReservationsService::new(
                repository.clone(),
                lending,
                materials.clone(),
                notifications.clone(),
            ),
            maintenance: maintenance::MaintenanceService::new(
                repository.clone(),
                materials.clone(),
                notifications.clone(),
            ),
            loans: loans::LoansService::new(repository.clone()),
            requests: requests::RequestsService::new(repository.clone()),
            materials,
            notifications,
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await?;
        Ok(())
    }
}

/// Local calendar day used for "today" comparisons
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Date as shown in user-facing messages
pub(crate) fn display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Recompute the availability flag from the active loans covering `today`
pub(crate) async fn refresh_availability(
    repository: &Repository,
    conn: &mut PgConnection,
    material_id: i32,
    today: NaiveDate,
) -> AppResult<bool> {
    let busy = repository.loans.covers_day(conn, material_id, today).await?;
    repository.materials.set_available(conn, material_id, !busy).await?;
    Ok(!busy)
}
