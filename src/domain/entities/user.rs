use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error in the creation or manipulation of user entities
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),
}

pub type UserResult<T> = Result<T, UserError>;

/// Subscription tier, only affects derived limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Premium,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Premium => "premium",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn from_str(value: &str) -> Self {
        match value {
            "premium" => SubscriptionPlan::Premium,
            "enterprise" => SubscriptionPlan::Enterprise,
            _ => SubscriptionPlan::Free,
        }
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents an account owning a forest of items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    id: Uuid,
    username: String,
    email: String,
    #[serde(skip_serializing)]
    password_hash: String,
    subscription_plan: SubscriptionPlan,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Creates a new user with validation
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        subscription_plan: SubscriptionPlan,
    ) -> UserResult<Self> {
        if username.is_empty() || username.len() > 32 {
            return Err(UserError::InvalidUsername(username));
        }
        if !email.contains('@') {
            return Err(UserError::InvalidEmail(email));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            password_hash,
            subscription_plan,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstructs a user from stored data
    pub fn from_row(
        id: Uuid,
        username: String,
        email: String,
        password_hash: String,
        subscription_plan: SubscriptionPlan,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            email,
            password_hash,
            subscription_plan,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &Uuid {
        &self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn subscription_plan(&self) -> SubscriptionPlan {
        self.subscription_plan
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}
