use uuid::Uuid;

use crate::{
    error::AppResult,
    users::{
        repo_types::User,
        roles::{outranks, RoleStore},
    },
};

/// Role a non-owner must outrank to delete another account.
pub const DELETE_USER_ROLE: &str = "moderator";

/// Users may delete themselves; anyone else needs to outrank a moderator.
pub async fn may_delete_user(roles: &dyn RoleStore, actor: &User, target: Uuid) -> AppResult<bool> {
    if actor.id == target {
        return Ok(true);
    }
    outranks(roles, actor, DELETE_USER_ROLE).await
}
