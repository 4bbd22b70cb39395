use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::store::{with_deadline, StoreError, StoreResult};

/// Directed follower graph: one edge per (followed, follower) pair.
#[async_trait]
pub trait FollowerStore: Send + Sync {
    /// A duplicate edge is `Conflict`; an unknown user is `NotFound`.
    async fn follow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()>;

    /// Removing an edge that does not exist is `NotFound`.
    async fn unfollow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()>;
}

pub struct PgFollowerStore {
    db: PgPool,
    timeout: Duration,
}

impl PgFollowerStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl FollowerStore for PgFollowerStore {
    async fn follow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            sqlx::query("INSERT INTO followers (user_id, follower_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(follower_id)
                .execute(&self.db)
                .await
                .map_err(StoreError::from_db)?;
            Ok(())
        })
        .await
    }

    async fn unfollow(&self, follower_id: Uuid, user_id: Uuid) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            let res = sqlx::query("DELETE FROM followers WHERE user_id = $1 AND follower_id = $2")
                .bind(user_id)
                .bind(follower_id)
                .execute(&self.db)
                .await
                .map_err(StoreError::from_db)?;
            if res.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }
            Ok(())
        })
        .await
    }
}
