//! User store backed by PostgreSQL.

use async_trait::async_trait;
use sqlx::PgPool;

use kmem_core::error::{AppError, ErrorKind};
use kmem_core::result::AppResult;
use kmem_entity::User;

use super::is_unique_violation;
use crate::store::UserStore;

/// PostgreSQL implementation of [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, username: &str, password_hash: &str) -> AppResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, password_hash) VALUES ($1, $2) RETURNING *",
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("User '{username}' already exists"))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create user", e)
            }
        })
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to find user by username", e)
            })
    }
}
