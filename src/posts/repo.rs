use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    feed::query::FeedQuery,
    posts::repo_types::{NewPost, Post, PostWithMetadata},
    store::{with_deadline, StoreError, StoreResult},
};

const POST_COLUMNS: &str =
    "id, user_id, title, content, tags, version, created_at, updated_at";

#[async_trait]
pub trait PostStore: Send + Sync {
    async fn create(&self, post: NewPost) -> StoreResult<Post>;

    async fn get_by_id(&self, post_id: Uuid) -> StoreResult<Post>;

    /// Conditional write on `post.version`. Zero matched rows (stale version
    /// or unknown id) is `VersionConflict`; nothing is changed in that case.
    async fn update(&self, post: &Post) -> StoreResult<Post>;

    /// Unconditional by id.
    async fn delete(&self, post_id: Uuid) -> StoreResult<()>;

    /// Posts by `user_id` and by everyone `user_id` follows.
    async fn user_feed(&self, user_id: Uuid, query: &FeedQuery)
        -> StoreResult<Vec<PostWithMetadata>>;
}

pub struct PgPostStore {
    db: PgPool,
    timeout: Duration,
}

impl PgPostStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn create(&self, post: NewPost) -> StoreResult<Post> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Post>(&format!(
                r#"
                INSERT INTO posts (user_id, title, content, tags)
                VALUES ($1, $2, $3, $4)
                RETURNING {POST_COLUMNS}
                "#
            ))
            .bind(post.user_id)
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.tags)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)
        })
        .await
    }

    async fn get_by_id(&self, post_id: Uuid) -> StoreResult<Post> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Post>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
            ))
            .bind(post_id)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)
        })
        .await
    }

    async fn update(&self, post: &Post) -> StoreResult<Post> {
        with_deadline(self.timeout, async {
            // condition and increment are evaluated in a single statement
            sqlx::query_as::<_, Post>(&format!(
                r#"
                UPDATE posts
                SET title = $1, content = $2, tags = $3,
                    version = version + 1, updated_at = now()
                WHERE id = $4 AND version = $5
                RETURNING {POST_COLUMNS}
                "#
            ))
            .bind(&post.title)
            .bind(&post.content)
            .bind(&post.tags)
            .bind(post.id)
            .bind(post.version)
            .fetch_optional(&self.db)
            .await
            .map_err(StoreError::from_db)?
            .ok_or(StoreError::VersionConflict)
        })
        .await
    }

    async fn delete(&self, post_id: Uuid) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            let res = sqlx::query("DELETE FROM posts WHERE id = $1")
                .bind(post_id)
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

    async fn user_feed(
        &self,
        user_id: Uuid,
        query: &FeedQuery,
    ) -> StoreResult<Vec<PostWithMetadata>> {
        let dir = query.sort.as_sql();
        let sql = format!(
            r#"
            SELECT p.id, p.user_id, p.title, p.content, p.tags, p.version,
                   p.created_at, p.updated_at,
                   COALESCE(u.username, '') AS username,
                   COUNT(c.id) AS comments_count
            FROM posts p
            LEFT JOIN users u ON u.id = p.user_id
            LEFT JOIN comments c ON c.post_id = p.id
            WHERE (
                    p.user_id = $1
                    OR EXISTS (
                        SELECT 1 FROM followers f
                        WHERE f.user_id = p.user_id AND f.follower_id = $1
                    )
                  )
              AND (
                    $2::text IS NULL
                    OR strpos(lower(p.title), lower($2)) > 0
                    OR strpos(lower(p.content), lower($2)) > 0
                  )
              AND p.tags @> $3::text[]
              AND ($4::timestamptz IS NULL OR p.created_at >= $4)
              AND ($5::timestamptz IS NULL OR p.created_at <= $5)
            GROUP BY p.id, u.username
            ORDER BY p.created_at {dir}, p.id {dir}
            LIMIT $6 OFFSET $7
            "#
        );

        with_deadline(self.timeout, async {
            sqlx::query_as::<_, PostWithMetadata>(&sql)
                .bind(user_id)
                .bind(query.search.as_deref())
                .bind(&query.tags)
                .bind(query.since)
                .bind(query.until)
                .bind(query.limit)
                .bind(query.offset)
                .fetch_all(&self.db)
                .await
                .map_err(StoreError::from_db)
        })
        .await
    }
}
