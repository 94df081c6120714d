use async_trait::async_trait;
use uuid::Uuid;

use crate::common::errors::Result;
use crate::domain::services::plan_limits::TeamspaceLimits;

/// Port exposing plan-derived limits to upstream decisions. The core
/// consumes limits, it does not enforce quota itself.
#[async_trait]
pub trait QuotaUseCase: Send + Sync {
    async fn teamspace_limits(&self, user_id: Uuid) -> Result<TeamspaceLimits>;
}
