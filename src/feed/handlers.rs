use axum::{
    extract::{FromRef, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::extractors::CurrentUser,
    error::{AppResult, Envelope},
    extract::AppQuery,
    feed::{query::FeedParams, services::FeedService},
    posts::repo_types::PostWithMetadata,
    state::AppState,
};

pub fn feed_routes() -> Router<AppState> {
    Router::new().route("/users/feed", get(get_user_feed))
}

#[instrument(skip(state, actor), fields(actor_id = %actor.id))]
pub async fn get_user_feed(
    State(state): State<AppState>,
    CurrentUser(actor): CurrentUser,
    AppQuery(params): AppQuery<FeedParams>,
) -> AppResult<Json<Envelope<Vec<PostWithMetadata>>>> {
    let query = params.validate(&state.validator)?;
    let rows = FeedService::from_ref(&state)
        .get_user_feed(actor.id, &query)
        .await?;
    Ok(Envelope::new(rows))
}
