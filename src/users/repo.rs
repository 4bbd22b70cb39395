use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    store::{with_deadline, StoreError, StoreResult},
    users::repo_types::{NewUser, User, UserRow},
};

const USER_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.password_hash, u.is_active, u.created_at, u.updated_at,
    r.id AS role_id, r.name AS role_name, r.description AS role_description, r.level AS role_level
"#;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert an inactive user and its invitation in one transaction.
    async fn create_and_invite(
        &self,
        user: NewUser,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<User>;

    /// Redeem an unexpired invitation: activate its user and burn the token,
    /// all in one transaction. Unknown and expired tokens are both `NotFound`.
    async fn activate(&self, token_hash: &str) -> StoreResult<()>;

    /// Delete a user and any remaining invitations in one transaction.
    async fn delete(&self, user_id: Uuid) -> StoreResult<()>;

    /// Delete the still inactive user holding this invitation, if the
    /// registration that created it committed. `NotFound` otherwise.
    async fn discard_invited(&self, token_hash: &str) -> StoreResult<()>;

    /// Active users only.
    async fn get_by_id(&self, user_id: Uuid) -> StoreResult<User>;

    /// Active users only.
    async fn get_by_email(&self, email: &str) -> StoreResult<User>;
}

pub struct PgUserStore {
    db: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_and_invite(
        &self,
        user: NewUser,
        token_hash: &str,
        expires_at: OffsetDateTime,
    ) -> StoreResult<User> {
        with_deadline(self.timeout, async {
            let mut tx = self.db.begin().await.map_err(StoreError::from_db)?;

            let row = sqlx::query_as::<_, UserRow>(&format!(
                r#"
                WITH u AS (
                    INSERT INTO users (username, email, password_hash, role_id)
                    VALUES ($1, $2, $3, (SELECT id FROM roles WHERE name = $4))
                    RETURNING *
                )
                SELECT {USER_COLUMNS}
                FROM u
                JOIN roles r ON r.id = u.role_id
                "#
            ))
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            sqlx::query(
                r#"
                INSERT INTO user_invitations (token, user_id, expiry)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(token_hash)
            .bind(row.id)
            .bind(expires_at)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from_db)?;

            tx.commit().await.map_err(StoreError::from_db)?;
            Ok(row.into())
        })
        .await
    }

    async fn activate(&self, token_hash: &str) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            let mut tx = self.db.begin().await.map_err(StoreError::from_db)?;

            let user_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT u.id
                FROM users u
                JOIN user_invitations ui ON ui.user_id = u.id
                WHERE ui.token = $1 AND ui.expiry > now()
                "#,
            )
            .bind(token_hash)
            .fetch_optional(&mut *tx)
            .await
            .map_err(StoreError::from_db)?
            .ok_or(StoreError::NotFound)?;

            sqlx::query("UPDATE users SET is_active = TRUE, updated_at = now() WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;

            sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;

            tx.commit().await.map_err(StoreError::from_db)
        })
        .await
    }

    async fn delete(&self, user_id: Uuid) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            let mut tx = self.db.begin().await.map_err(StoreError::from_db)?;

            sqlx::query("DELETE FROM user_invitations WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;

            let res = sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(StoreError::from_db)?;
            if res.rows_affected() == 0 {
                return Err(StoreError::NotFound);
            }

            tx.commit().await.map_err(StoreError::from_db)
        })
        .await
    }

    async fn discard_invited(&self, token_hash: &str) -> StoreResult<()> {
        with_deadline(self.timeout, async {
            // invitations go with the user via ON DELETE CASCADE
            let res = sqlx::query(
                r#"
                DELETE FROM users u
                USING user_invitations ui
                WHERE ui.user_id = u.id AND ui.token = $1 AND u.is_active = FALSE
                "#,
            )
            .bind(token_hash)
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

    async fn get_by_id(&self, user_id: Uuid) -> StoreResult<User> {
        with_deadline(self.timeout, async {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users u
                JOIN roles r ON r.id = u.role_id
                WHERE u.id = $1 AND u.is_active = TRUE
                "#
            ))
            .bind(user_id)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)?;
            Ok(row.into())
        })
        .await
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        with_deadline(self.timeout, async {
            let row = sqlx::query_as::<_, UserRow>(&format!(
                r#"
                SELECT {USER_COLUMNS}
                FROM users u
                JOIN roles r ON r.id = u.role_id
                WHERE u.email = $1 AND u.is_active = TRUE
                "#
            ))
            .bind(email)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)?;
            Ok(row.into())
        })
        .await
    }
}
