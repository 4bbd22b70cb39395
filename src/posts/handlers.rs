use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    error::{AppError, AppResult, Envelope},
    extract::{AppJson, AppPath},
    posts::{
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{Post, PostWithComments},
        services::{PostService, DELETE_POST_ROLE, UPDATE_POST_ROLE},
    },
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", post(create_post))
        .route(
            "/posts/:id",
            get(get_post).patch(update_post).delete(delete_post),
        )
}

#[instrument(skip(state, actor, payload), fields(actor_id = %actor.id))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppJson(payload): AppJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Envelope<Post>>)> {
    let payload = payload.validate(&state.validator)?;
    let post = PostService::from_ref(&state).create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Envelope::new(post)))
}

#[instrument(skip(state, _actor))]
pub async fn get_post(
    State(state): State<AppState>,
    CurrentUser(_actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<Envelope<PostWithComments>>> {
    let svc = PostService::from_ref(&state);
    let post = svc.get_post(id).await?;
    Ok(Envelope::new(svc.get_with_comments(post).await?))
}

#[instrument(skip(state, actor, payload), fields(actor_id = %actor.id))]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePostRequest>,
) -> AppResult<Json<Envelope<Post>>> {
    let payload = payload.validate(&state.validator)?;
    let svc = PostService::from_ref(&state);
    let post = svc.get_post(id).await?;
    if !svc.check_ownership(&actor, &post, UPDATE_POST_ROLE).await? {
        warn!(post_id = %id, "post update forbidden");
        return Err(AppError::Forbidden);
    }
    Ok(Envelope::new(svc.update(post, payload).await?))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<StatusCode> {
    let svc = PostService::from_ref(&state);
    let post = svc.get_post(id).await?;
    if !svc.check_ownership(&actor, &post, DELETE_POST_ROLE).await? {
        warn!(post_id = %id, "post delete forbidden");
        return Err(AppError::Forbidden);
    }
    svc.delete(post.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
