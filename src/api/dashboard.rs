//! User dashboard: loans, return and cancellation actions

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::loan::{CancelLoanRequest, Dashboard, DashboardScope, Loan, ReturnLoanRequest, ReturnRecord},
};

use super::{parse_body, AuthenticatedUser};

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardQuery {
    /// `mine` (default) or `all` for administrators
    pub scope: Option<DashboardScope>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DashboardAction {
    Return,
    CancelRequest,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct DashboardActionQuery {
    /// return or cancel_request
    pub action: Option<DashboardAction>,
}

/// Closed loan
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    pub status: String,
    pub record: ReturnRecord,
    /// Condition change summary, e.g. `degrade:bon->passable`
    pub label: String,
}

#[derive(Serialize, ToSchema)]
pub struct CancelResponse {
    pub status: String,
    pub loan: Loan,
}

/// Get the caller's loans (or every loan for `scope=all`) with statistics
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(DashboardQuery),
    responses(
        (status = 200, description = "Loans and statistics", body = Dashboard),
        (status = 403, description = "scope=all without admin role", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> AppResult<Json<Dashboard>> {
    let dashboard = state
        .services
        .loans
        .dashboard(&ctx, query.scope.unwrap_or_default())
        .await?;
    Ok(Json(dashboard))
}

/// Return a loan or ask for its cancellation
#[utoipa::path(
    post,
    path = "/dashboard",
    tag = "dashboard",
    security(("bearer_auth" = [])),
    params(DashboardActionQuery),
    request_body(content = Object, description = "ReturnLoanRequest or CancelLoanRequest"),
    responses(
        (status = 200, description = "Loan returned", body = ReturnResponse),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the borrower", body = crate::error::ErrorResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Loan already closed", body = crate::error::ErrorResponse)
    )
)]
pub async fn dashboard_action(
    State(state): State<crate::AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    query: Result<Query<DashboardActionQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let Json(body) = body?;
    let action = query
        .action
        .ok_or_else(|| AppError::Validation("Paramètre action manquant".to_string()))?;

    match action {
        DashboardAction::Return => {
            let request: ReturnLoanRequest = parse_body(body)?;
            let record = state.services.loans.return_loan(&ctx, &request).await?;
            let label = record.state.label();
            Ok(Json(ReturnResponse {
                status: "ok".to_string(),
                record,
                label,
            })
            .into_response())
        }
        DashboardAction::CancelRequest => {
            let request: CancelLoanRequest = parse_body(body)?;
            let loan = state.services.loans.request_cancellation(&ctx, &request).await?;
            Ok(Json(CancelResponse {
                status: "ok".to_string(),
                loan,
            })
            .into_response())
        }
    }
}
