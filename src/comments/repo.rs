use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    comments::repo_types::{Comment, CommentWithAuthor, NewComment},
    store::{with_deadline, StoreError, StoreResult},
};

/// Comments are append-only.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment>;

    /// Newest first.
    async fn list_by_post(&self, post_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>>;
}

pub struct PgCommentStore {
    db: PgPool,
    timeout: Duration,
}

impl PgCommentStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn create(&self, comment: NewComment) -> StoreResult<Comment> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Comment>(
                r#"
                INSERT INTO comments (post_id, user_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, post_id, user_id, content, created_at, updated_at
                "#,
            )
            .bind(comment.post_id)
            .bind(comment.user_id)
            .bind(&comment.content)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)
        })
        .await
    }

    async fn list_by_post(&self, post_id: Uuid) -> StoreResult<Vec<CommentWithAuthor>> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, CommentWithAuthor>(
                r#"
                SELECT c.id, c.post_id, c.user_id, c.content, c.created_at, c.updated_at,
                       u.username
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.post_id = $1
                ORDER BY c.created_at DESC
                "#,
            )
            .bind(post_id)
            .fetch_all(&self.db)
            .await
            .map_err(StoreError::from_db)
        })
        .await
    }
}
