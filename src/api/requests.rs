//! Pending request queue (admin)

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::request::{PendingRequestDetails, PendingRequestQuery},
};

use super::AuthenticatedUser;

/// List pending reservation and maintenance requests
#[utoipa::path(
    get,
    path = "/requests",
    tag = "requests",
    security(("bearer_auth" = [])),
    params(PendingRequestQuery),
    responses(
        (status = 200, description = "Pending requests, oldest first", body = Vec<PendingRequestDetails>),
        (status = 403, description = "Admin only", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_pending_requests(
    State(state): State<crate::AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Query(query): Query<PendingRequestQuery>,
) -> AppResult<Json<Vec<PendingRequestDetails>>> {
    let requests = state.services.requests.list_pending(&ctx, query.kind).await?;
    Ok(Json(requests))
}
