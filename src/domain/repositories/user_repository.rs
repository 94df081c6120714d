use async_trait::async_trait;
use uuid::Uuid;

use crate::common::errors::{DomainError, ErrorKind};
use crate::domain::entities::user::User;

/// Errors that can occur in user repository operations
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found: {0}")]
    NotFound(String),

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<UserRepositoryError> for DomainError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound(msg) => DomainError::not_found("User", msg),
            UserRepositoryError::AlreadyExists(msg) => DomainError::already_exists("User", msg),
            UserRepositoryError::DatabaseError(msg) => {
                DomainError::new(ErrorKind::Internal, "User", msg)
            }
        }
    }
}

pub type UserRepositoryResult<T> = Result<T, UserRepositoryError>;

/// Repository port for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: User) -> UserRepositoryResult<User>;

    async fn get_user_by_id(&self, id: &Uuid) -> UserRepositoryResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> UserRepositoryResult<Option<User>>;
}
