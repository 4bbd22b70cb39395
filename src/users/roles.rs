use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::{
    error::{AppError, AppResult},
    store::{with_deadline, StoreError, StoreResult},
    users::repo_types::{Role, User},
};

pub const DEFAULT_ROLE: &str = "user";

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn get_by_name(&self, name: &str) -> StoreResult<Role>;
}

pub struct PgRoleStore {
    db: PgPool,
    timeout: Duration,
}

impl PgRoleStore {
    pub fn new(db: PgPool, timeout: Duration) -> Self {
        Self { db, timeout }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn get_by_name(&self, name: &str) -> StoreResult<Role> {
        with_deadline(self.timeout, async {
            sqlx::query_as::<_, Role>(
                "SELECT id, name, description, level FROM roles WHERE name = $1",
            )
            .bind(name)
            .fetch_one(&self.db)
            .await
            .map_err(StoreError::from_db)
        })
        .await
    }
}

/// True when `actor`'s role level is strictly above the level of `required`.
///
/// A role lookup failure of any kind is a persistence problem, not a denial.
pub async fn outranks(roles: &dyn RoleStore, actor: &User, required: &str) -> AppResult<bool> {
    let role = roles
        .get_by_name(required)
        .await
        .map_err(AppError::Persistence)?;
    Ok(actor.role.level > role.level)
}
