use axum::extract::FromRef;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    state::AppState,
    store::Storage,
    users::repo_types::User,
};

#[derive(Clone)]
pub struct FollowerService {
    store: Storage,
}

impl FromRef<AppState> for FollowerService {
    fn from_ref(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }
}

impl FollowerService {
    /// A second follow of the same user is `Conflict`.
    pub async fn follow(&self, actor: &User, target: Uuid) -> AppResult<()> {
        if actor.id == target {
            return Err(AppError::validation("cannot follow yourself"));
        }
        self.store.followers.follow(actor.id, target).await?;
        info!(follower_id = %actor.id, user_id = %target, "followed");
        Ok(())
    }

    pub async fn unfollow(&self, actor: &User, target: Uuid) -> AppResult<()> {
        self.store.followers.unfollow(actor.id, target).await?;
        info!(follower_id = %actor.id, user_id = %target, "unfollowed");
        Ok(())
    }
}
