//! Profile lookup seam. The chat service only needs to know whether a
//! receiver id refers to a real profile before accepting a send; the profile
//! data itself is owned by the profile service.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::error::AppResult;
use crate::models::UserId;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, user: &UserId) -> AppResult<bool>;
}

/// Production lookup against the profile service's table.
#[derive(Clone)]
pub struct PgUserDirectory {
    db: Pool<Postgres>,
}

impl PgUserDirectory {
    pub fn new(db: Pool<Postgres>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn user_exists(&self, user: &UserId) -> AppResult<bool> {
        // The profiles table is owned by the profile service; we only read it.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM profiles WHERE id = $1)")
                .bind(user.as_str())
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }
}

/// Fixed set of known users, for tests and local development.
#[derive(Default)]
pub struct StaticUserDirectory {
    users: RwLock<HashSet<UserId>>,
}

impl StaticUserDirectory {
    pub fn new(users: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            users: RwLock::new(users.into_iter().collect()),
        }
    }

    pub async fn add(&self, user: UserId) {
        self.users.write().await.insert(user);
    }
}

#[async_trait]
impl UserDirectory for StaticUserDirectory {
    async fn user_exists(&self, user: &UserId) -> AppResult<bool> {
        Ok(self.users.read().await.contains(user))
    }
}
