//! Loan (emprunt) and return (rendu) models

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::material::Condition;
use crate::{
    calendar::DateRange,
    error::{AppError, AppResult},
};

/// Kind of booking stored on a loan row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum LoanKind {
    #[serde(rename = "En cours")]
    Ongoing,
    #[serde(rename = "Maintenance")]
    Maintenance,
    /// The borrower asked for the loan to be cancelled
    #[serde(rename = "Annulation demandee")]
    CancellationRequested,
}

impl LoanKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoanKind::Ongoing => "En cours",
            LoanKind::Maintenance => "Maintenance",
            LoanKind::CancellationRequested => "Annulation demandee",
        }
    }
}

impl std::str::FromStr for LoanKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "En cours" => Ok(LoanKind::Ongoing),
            "Maintenance" => Ok(LoanKind::Maintenance),
            "Annulation demandee" => Ok(LoanKind::CancellationRequested),
            _ => Err(format!("Invalid loan kind: {}", s)),
        }
    }
}

text_column!(LoanKind);

/// Loan model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Loan {
    pub id: i32,
    pub material_id: i32,
    pub user_id: i32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: LoanKind,
    pub crea_date: DateTime<Utc>,
}

impl Loan {
    pub fn range(&self) -> DateRange {
        DateRange::new(self.start_date, self.end_date)
    }

    pub fn is_maintenance(&self) -> bool {
        self.kind == LoanKind::Maintenance
    }
}

/// Condition transition recorded when a loan is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnState {
    pub previous_condition: Condition,
    pub new_condition: Condition,
    pub degraded: bool,
}

impl ReturnState {
    /// Work out the condition after a return.
    ///
    /// Maintenance always leaves the material in `bon` condition. Otherwise
    /// the declared condition (defaulting to `before`) may not be better
    /// than the one recorded before the loan.
    pub fn evaluate(kind: LoanKind, before: Condition, declared: Option<Condition>) -> AppResult<Self> {
        let after = if kind == LoanKind::Maintenance {
            Condition::Bon
        } else {
            let after = declared.unwrap_or(before);
            if after.rank() > before.rank() {
                return Err(AppError::Validation(format!(
                    "L'état déclaré ({}) ne peut pas être meilleur que l'état avant l'emprunt ({})",
                    after, before
                )));
            }
            after
        };

        Ok(Self {
            previous_condition: before,
            new_condition: after,
            degraded: after.rank() < before.rank(),
        })
    }

    /// Short label such as `bon` or `degrade:bon->passable`
    pub fn label(&self) -> String {
        if self.degraded {
            format!("degrade:{}->{}", self.previous_condition, self.new_condition)
        } else {
            self.new_condition.to_string()
        }
    }
}

/// Return row (1:1 with its loan)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ReturnRecord {
    pub loan_id: i32,
    pub return_date: NaiveDate,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub state: ReturnState,
}

/// Loan joined with material, borrower and return information
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoanSummary {
    pub id: i32,
    pub material_id: i32,
    pub material_name: String,
    pub material_reference: String,
    pub user_id: i32,
    pub borrower: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub kind: LoanKind,
    pub return_date: Option<NaiveDate>,
    pub return_state: Option<ReturnState>,
    /// Unreturned and past its end date
    pub overdue: bool,
}

/// Dashboard counters
#[derive(Debug, Clone, Default, Serialize, FromRow, ToSchema)]
pub struct LoanStats {
    pub total: i64,
    pub active: i64,
    pub overdue: i64,
    pub returned: i64,
    pub maintenance: i64,
    pub pending_requests: i64,
}

/// Whose loans the dashboard shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DashboardScope {
    #[default]
    Mine,
    /// Every user (admin only)
    All,
}

/// Dashboard response
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Dashboard {
    pub loans: Vec<LoanSummary>,
    pub stats: LoanStats,
}

/// Body of `reserve` and `maintenance` actions
#[derive(Debug, Deserialize, ToSchema)]
pub struct PeriodRequest {
    /// Material ID
    pub id: i32,
    /// Start date (YYYY-MM-DD)
    pub start: String,
    /// End date (YYYY-MM-DD), swapped with start when earlier
    pub end: String,
}

impl PeriodRequest {
    pub fn validate(&self) -> AppResult<(i32, DateRange)> {
        if self.id <= 0 {
            return Err(AppError::Validation("Identifiant de matériel invalide".to_string()));
        }
        Ok((self.id, DateRange::parse(&self.start, &self.end)?))
    }
}

/// Body of the `return` dashboard action
#[derive(Debug, Deserialize, ToSchema)]
pub struct ReturnLoanRequest {
    /// Loan ID
    pub id: i32,
    /// Condition after return, defaults to the condition before the loan
    pub condition: Option<Condition>,
}

/// Body of the `cancel_request` dashboard action
#[derive(Debug, Deserialize, ToSchema)]
pub struct CancelLoanRequest {
    /// Loan ID
    pub id: i32,
}
