//! Equipment catalog and lending actions

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::{
        loan::PeriodRequest,
        material::{CatalogEntry, CreateMaterial},
        request::{DecideRequest, DecisionOutcome, WorkflowOutcome},
    },
};

use super::{parse_body, AuthenticatedUser};

/// Action selected through the `action` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentAction {
    Create,
    Reserve,
    Maintenance,
    MaintenanceDecide,
    ReservationDecide,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EquipmentActionQuery {
    /// create, reserve, maintenance, maintenance_decide or reservation_decide
    pub action: Option<EquipmentAction>,
}

/// List the catalog with derived status and bookings
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Catalog", body = Vec<CatalogEntry>),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_ctx): AuthenticatedUser,
) -> AppResult<Json<Vec<CatalogEntry>>> {
    let catalog = state.services.materials.catalog().await?;
    Ok(Json(catalog))
}

/// Run an equipment action; the body shape depends on `action`
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    security(("bearer_auth" = [])),
    params(EquipmentActionQuery),
    request_body(content = Object, description = "CreateMaterial, PeriodRequest or DecideRequest"),
    responses(
        (status = 200, description = "Booking or scheduling outcome", body = WorkflowOutcome),
        (status = 201, description = "Material created", body = CatalogEntry),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown material or request", body = crate::error::ErrorResponse),
        (status = 409, description = "Conflicting booking", body = crate::error::ErrorResponse)
    )
)]
pub async fn equipment_action(
    State(state): State<crate::AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    query: Result<Query<EquipmentActionQuery>, QueryRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let Json(body) = body?;
    let action = query
        .action
        .ok_or_else(|| AppError::Validation("Paramètre action manquant".to_string()))?;

    let response = match action {
        EquipmentAction::Create => {
            let data: CreateMaterial = parse_body(body)?;
            let entry = state.services.materials.create(&ctx, &data).await?;
            (axum::http::StatusCode::CREATED, Json(entry)).into_response()
        }
        EquipmentAction::Reserve => {
            let request: PeriodRequest = parse_body(body)?;
            let outcome: WorkflowOutcome = state.services.reservations.reserve(&ctx, &request).await?;
            Json(outcome).into_response()
        }
        EquipmentAction::Maintenance => {
            let request: PeriodRequest = parse_body(body)?;
            let outcome = state.services.maintenance.schedule(&ctx, &request).await?;
            Json(outcome).into_response()
        }
        EquipmentAction::MaintenanceDecide => {
            let decision: DecideRequest = parse_body(body)?;
            let outcome: DecisionOutcome = state.services.maintenance.decide(&ctx, &decision).await?;
            Json(outcome).into_response()
        }
        EquipmentAction::ReservationDecide => {
            let decision: DecideRequest = parse_body(body)?;
            let outcome = state.services.reservations.decide(&ctx, &decision).await?;
            Json(outcome).into_response()
        }
    };

    Ok(response)
}
