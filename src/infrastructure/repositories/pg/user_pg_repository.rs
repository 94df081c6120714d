use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::user::{SubscriptionPlan, User};
use crate::domain::repositories::user_repository::{
    UserRepository, UserRepositoryError, UserRepositoryResult,
};

pub struct UserPgRepository {
    pool: Arc<PgPool>,
}

impl UserPgRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    // Helper to map SQL errors to repository errors
    fn map_sqlx_error(err: sqlx::Error) -> UserRepositoryError {
        match err {
            sqlx::Error::RowNotFound => {
                UserRepositoryError::NotFound("User not found".to_string())
            }
            sqlx::Error::Database(db_err) => {
                if db_err.code().map_or(false, |code| code == "23505") {
                    // PostgreSQL unique violation
                    UserRepositoryError::AlreadyExists(
                        "Username or email already taken".to_string(),
                    )
                } else {
                    UserRepositoryError::DatabaseError(format!("Database error: {}", db_err))
                }
            }
            _ => UserRepositoryError::DatabaseError(format!("Database error: {}", err)),
        }
    }

    fn row_to_user(row: &PgRow) -> User {
        let plan_str: String = row.get("subscription_plan");
        User::from_row(
            row.get("id"),
            row.get("username"),
            row.get("email"),
            row.get("password_hash"),
            SubscriptionPlan::from_str(&plan_str),
            row.get("created_at"),
            row.get("updated_at"),
        )
    }
}

#[async_trait]
impl UserRepository for UserPgRepository {
    async fn create_user(&self, user: User) -> UserRepositoryResult<User> {
        sqlx::query(
            r#"
            INSERT INTO storage.users (
                id, username, email, password_hash, subscription_plan,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user.id())
        .bind(user.username())
        .bind(user.email())
        .bind(user.password_hash())
        .bind(user.subscription_plan().as_str())
        .bind(user.created_at())
        .bind(user.updated_at())
        .execute(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(user)
    }

    async fn get_user_by_id(&self, id: &Uuid) -> UserRepositoryResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, subscription_plan,
                   created_at, updated_at
            FROM storage.users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(Self::row_to_user))
    }

    async fn get_user_by_username(&self, username: &str) -> UserRepositoryResult<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, subscription_plan,
                   created_at, updated_at
            FROM storage.users
            WHERE lower(username) = lower($1)
            "#,
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(Self::map_sqlx_error)?;

        Ok(row.as_ref().map(Self::row_to_user))
    }
}
