use axum::extract::FromRef;
use tracing::info;

use crate::{
    comments::repo_types::{Comment, NewComment},
    error::AppResult,
    posts::repo_types::Post,
    state::AppState,
    store::Storage,
    users::repo_types::User,
};

#[derive(Clone)]
pub struct CommentService {
    store: Storage,
}

impl FromRef<AppState> for CommentService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl CommentService {
    pub fn new(store: Storage) -> Self {
        Self { store }
    }

    pub async fn add(&self, author: &User, post: &Post, content: String) -> AppResult<Comment> {
        let comment = self
            .store
            .comments
            .create(NewComment {
                post_id: post.id,
                user_id: author.id,
                content,
            })
            .await?;
        info!(comment_id = %comment.id, post_id = %post.id, "comment added");
        Ok(comment)
    }
}
