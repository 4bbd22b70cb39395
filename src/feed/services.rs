use axum::extract::FromRef;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::AppResult, feed::query::FeedQuery, posts::repo_types::PostWithMetadata,
    state::AppState, store::Storage,
};

#[derive(Clone)]
pub struct FeedService {
    store: Storage,
}

impl FromRef<AppState> for FeedService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl FeedService {
    pub fn new(store: Storage) -> Self {
        Self { store }
    }

    /// Read-only: posts by `user_id` and the users they follow, filtered and
    /// paginated by an already validated query.
    pub async fn get_user_feed(
        &self,
        user_id: Uuid,
        query: &FeedQuery,
    ) -> AppResult<Vec<PostWithMetadata>> {
        let rows = self.store.posts.user_feed(user_id, query).await?;
        debug!(user_id = %user_id, rows = rows.len(), "feed loaded");
        Ok(rows)
    }
}
