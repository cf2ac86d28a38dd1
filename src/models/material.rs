//! Material (bookable equipment) model

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::loan::{Loan, LoanKind};
use crate::calendar::{derive_status, weeks_between, BookedPeriod};

/// Physical condition, ordered from worst to best
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Condition {
    /// Needs repair before it can be lent again
    Reparation,
    Passable,
    Bon,
    Neuf,
}

impl Condition {
    pub fn rank(&self) -> u8 {
        match self {
            Condition::Reparation => 0,
            Condition::Passable => 1,
            Condition::Bon => 2,
            Condition::Neuf => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Condition::Reparation => "reparation",
            Condition::Passable => "passable",
            Condition::Bon => "bon",
            Condition::Neuf => "neuf",
        }
    }
}

impl std::str::FromStr for Condition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "reparation" | "réparation" | "a reparer" | "à réparer" => Ok(Condition::Reparation),
            "passable" => Ok(Condition::Passable),
            "bon" => Ok(Condition::Bon),
            "neuf" => Ok(Condition::Neuf),
            _ => Err(format!("Invalid condition: {}", s)),
        }
    }
}

text_column!(Condition);

/// Catalog status for today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    Disponible,
    Reserve,
    Maintenance,
}

/// Material record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Material {
    pub id: i32,
    pub name: String,
    pub categories: Vec<String>,
    pub location: Option<String>,
    pub condition: Condition,
    /// False while a loan or a maintenance covers today
    pub available: bool,
    /// Serial reference such as `CAM-004`
    pub reference: String,
    pub picture: Option<String>,
    pub crea_date: DateTime<Utc>,
}

/// Create material request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateMaterial {
    #[validate(length(min = 1, max = 120, message = "Le nom est obligatoire"))]
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
    pub location: Option<String>,
    pub condition: Option<Condition>,
    /// Path of an already stored picture
    pub picture: Option<String>,
}

/// One active booking as exposed in the catalog
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReservationPeriod {
    pub loan_id: i32,
    pub user_id: i32,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub kind: LoanKind,
}

/// Material with its booking state, as listed by `GET /equipment`
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogEntry {
    pub id: i32,
    pub name: String,
    pub categories: Vec<String>,
    pub location: Option<String>,
    pub condition: Condition,
    pub available: bool,
    pub reference: String,
    pub picture: Option<String>,
    pub status: MaterialStatus,
    /// ISO weeks touched by active bookings (`2025-W02`)
    pub reserved_weeks: Vec<String>,
    pub reservations: Vec<ReservationPeriod>,
}

impl CatalogEntry {
    /// Build the entry from the material and its active (unreturned) loans
    pub fn build(material: Material, active_loans: &[&Loan], today: NaiveDate) -> Self {
        let periods: Vec<BookedPeriod> = active_loans
            .iter()
            .map(|loan| BookedPeriod {
                range: loan.range(),
                maintenance: loan.is_maintenance(),
            })
            .collect();

        let reserved_weeks: BTreeSet<String> = active_loans
            .iter()
            .flat_map(|loan| weeks_between(loan.start_date, loan.end_date))
            .collect();

        let reservations = active_loans
            .iter()
            .map(|loan| ReservationPeriod {
                loan_id: loan.id,
                user_id: loan.user_id,
                start: loan.start_date,
                end: loan.end_date,
                kind: loan.kind,
            })
            .collect();

        Self {
            status: derive_status(&periods, today),
            reserved_weeks: reserved_weeks.into_iter().collect(),
            reservations,
            id: material.id,
            name: material.name,
            categories: material.categories,
            location: material.location,
            condition: material.condition,
            available: material.available,
            reference: material.reference,
            picture: material.picture,
        }
    }
}
