//! Requests waiting for an administrator decision

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

use super::material::CatalogEntry;
use crate::calendar::DateRange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Reservation,
    Maintenance,
}

impl RequestKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestKind::Reservation => "reservation",
            RequestKind::Maintenance => "maintenance",
        }
    }
}

impl std::str::FromStr for RequestKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reservation" => Ok(RequestKind::Reservation),
            "maintenance" => Ok(RequestKind::Maintenance),
            _ => Err(format!("Invalid request kind: {}", s)),
        }
    }
}

text_column!(RequestKind);

/// Request lifecycle: `pending` moves once to `approved` or `rejected`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            _ => Err(format!("Invalid request status: {}", s)),
        }
    }
}

text_column!(RequestStatus);

/// Pending request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct PendingRequest {
    pub id: i32,
    pub kind: RequestKind,
    pub material_id: i32,
    /// Requesting user
    pub user_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl PendingRequest {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }
}

/// Pending request with display information for the admin queue
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct PendingRequestDetails {
    pub id: i32,
    pub kind: RequestKind,
    pub material_id: i32,
    pub material_name: String,
    pub user_id: i32,
    pub requester: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the admin queue
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PendingRequestQuery {
    pub kind: Option<RequestKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

/// Body of `maintenance_decide` and `reservation_decide`
#[derive(Debug, Deserialize, ToSchema)]
pub struct DecideRequest {
    /// Pending request ID
    pub id: i32,
    pub decision: Decision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Pending,
}

/// Result of a reservation or maintenance attempt
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkflowOutcome {
    pub status: OutcomeStatus,
    /// Material after the change (status `ok`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equipment: Option<CatalogEntry>,
    /// Queued request (status `pending`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<i32>,
}

impl WorkflowOutcome {
    pub fn done(equipment: CatalogEntry) -> Self {
        Self {
            status: OutcomeStatus::Ok,
            equipment: Some(equipment),
            request_id: None,
        }
    }

    pub fn pending(request_id: i32) -> Self {
        Self {
            status: OutcomeStatus::Pending,
            equipment: None,
            request_id: Some(request_id),
        }
    }
}

/// Result of an admin decision
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DecisionOutcome {
    pub status: OutcomeStatus,
    pub request: PendingRequest,
    /// Loan created by an approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_id: Option<i32>,
}
