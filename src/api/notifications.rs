//! Notification inbox

use axum::{extract::State, Json};

use crate::{error::AppResult, models::notification::Notification};

use super::AuthenticatedUser;

/// List the caller's notifications, newest first
#[utoipa::path(
    get,
    path = "/notifications",
    tag = "notifications",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Notifications", body = Vec<Notification>)
    )
)]
pub async fn list_notifications(
    State(state): State<crate::AppState>,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> AppResult<Json<Vec<Notification>>> {
    let notifications = state.services.notifications.list(&ctx).await?;
    Ok(Json(notifications))
}
