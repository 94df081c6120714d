use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::application::ports::quota_ports::QuotaUseCase;
use crate::common::errors::{DomainError, Result};
use crate::domain::repositories::user_repository::UserRepository;
use crate::domain::services::plan_limits::TeamspaceLimits;

/// Maps a user's subscription plan to its derived limits
pub struct QuotaService {
    user_repository: Arc<dyn UserRepository>,
}

impl QuotaService {
    pub fn new(user_repository: Arc<dyn UserRepository>) -> Self {
        Self { user_repository }
    }
}

#[async_trait]
impl QuotaUseCase for QuotaService {
    async fn teamspace_limits(&self, user_id: Uuid) -> Result<TeamspaceLimits> {
        let user = self
            .user_repository
            .get_user_by_id(&user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", user_id.to_string()))?;

        Ok(TeamspaceLimits::for_plan(user.subscription_plan()))
    }
}
