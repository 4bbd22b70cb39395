use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::put,
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::AppResult,
    extract::AppPath,
    followers::services::FollowerService,
    state::AppState,
};

pub fn follower_routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id/follow", put(follow_user))
        .route("/users/:id/unfollow", put(unfollow_user))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn follow_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    FollowerService::from_ref(&state).follow(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn unfollow_user(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    FollowerService::from_ref(&state).unfollow(&actor, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
