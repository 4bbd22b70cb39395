use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::CurrentUser,
    comments::{dto::CreateCommentRequest, repo_types::Comment, services::CommentService},
    error::{AppResult, Envelope},
    extract::{AppJson, AppPath},
    posts::services::PostService,
    state::AppState,
};

pub fn comment_routes() -> Router<AppState> {
    Router::new().route("/posts/:id/comments", post(create_comment))
}

#[instrument(skip(state, actor, payload), fields(actor_id = %actor.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppPath(post_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Envelope<Comment>>)> {
    let payload = payload.validate(&state.validator)?;
    let post = PostService::from_ref(&state).get_post(post_id).await?;
    let comment = CommentService::from_ref(&state)
        .add(&actor, &post, payload.content)
        .await?;
    Ok((StatusCode::CREATED, Envelope::new(comment)))
}
