//! Notification sink

use crate::{
    error::AppResult,
    models::{
        notification::{Notice, Notification},
        user::RequestContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct NotificationsService {
    repository: Repository,
}

impl NotificationsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Best-effort delivery: failures are logged and dropped, never retried
    pub async fn dispatch(&self, notices: Vec<Notice>) {
        for notice in notices {
            if let Err(e) = self.repository.notifications.create(&notice).await {
                tracing::warn!(user_id = notice.user_id, error = %e, "Failed to store notification");
            }
        }
    }

    /// Notifications of the caller
    pub async fn list(&self, ctx: &RequestContext) -> AppResult<Vec<Notification>> {
        self.repository.notifications.list_for_user(ctx.user_id).await
    }
}
