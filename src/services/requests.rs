//! Admin queue of pending requests

use crate::{
    error::AppResult,
    models::{
        request::{PendingRequestDetails, RequestKind},
        user::RequestContext,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct RequestsService {
    repository: Repository,
}

impl RequestsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list_pending(
        &self,
        ctx: &RequestContext,
        kind: Option<RequestKind>,
    ) -> AppResult<Vec<PendingRequestDetails>> {
        ctx.require_admin()?;
        self.repository.requests.list_pending(kind).await
    }
}
