use serde::{Deserialize, Serialize};

use crate::domain::entities::user::SubscriptionPlan;

/// Limits derived from a subscription plan. Never persisted: always
/// recomputed from the static table below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamspaceLimits {
    pub storage_limit_mb: u64,
    pub member_limit: u32,
    pub max_teamspaces: u32,
}

impl TeamspaceLimits {
    /// Static plan lookup table
    pub fn for_plan(plan: SubscriptionPlan) -> Self {
        match plan {
            SubscriptionPlan::Free => Self {
                storage_limit_mb: 1024,
                member_limit: 3,
                max_teamspaces: 1,
            },
            SubscriptionPlan::Premium => Self {
                storage_limit_mb: 100 * 1024,
                member_limit: 25,
                max_teamspaces: 10,
            },
            SubscriptionPlan::Enterprise => Self {
                storage_limit_mb: 1024 * 1024,
                member_limit: 250,
                max_teamspaces: 100,
            },
        }
    }
}
