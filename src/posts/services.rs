//! Post lifecycle with optimistic concurrency on `version`.

use axum::extract::FromRef;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::AppResult,
    posts::{
        dto::{CreatePostRequest, UpdatePostRequest},
        repo_types::{NewPost, Post, PostWithComments},
    },
    state::AppState,
    store::Storage,
    users::{repo_types::User, roles::outranks},
};

/// Role a non-owner must outrank to edit a post.
pub const UPDATE_POST_ROLE: &str = "moderator";
/// Role a non-owner must outrank to delete a post.
pub const DELETE_POST_ROLE: &str = "admin";

#[derive(Clone)]
pub struct PostService {
    store: Storage,
}

impl FromRef<AppState> for PostService {
    fn from_ref(state: &AppState) -> Self {
        Self::new(state.store.clone())
    }
}

impl PostService {
    pub fn new(store: Storage) -> Self {
        Self { store }
    }

    pub async fn create(&self, author: &User, req: CreatePostRequest) -> AppResult<Post> {
        let post = self
            .store
            .posts
            .create(NewPost {
                user_id: author.id,
                title: req.title,
                content: req.content,
                tags: req.tags,
            })
            .await?;
        info!(post_id = %post.id, user_id = %author.id, "post created");
        Ok(post)
    }

    pub async fn get_post(&self, post_id: Uuid) -> AppResult<Post> {
        Ok(self.store.posts.get_by_id(post_id).await?)
    }

    /// The post with its comments, newest comment first.
    pub async fn get_with_comments(&self, post: Post) -> AppResult<PostWithComments> {
        let comments = self.store.comments.list_by_post(post.id).await?;
        Ok(PostWithComments { post, comments })
    }

    /// Apply `patch` on top of `post` and write it only if the stored version
    /// still equals `patch.version`. A lost race is `VersionConflict`; this
    /// never retries.
    pub async fn update(&self, mut post: Post, patch: UpdatePostRequest) -> AppResult<Post> {
        if let Some(title) = patch.title {
            post.title = title;
        }
        if let Some(content) = patch.content {
            post.content = content;
        }
        if let Some(tags) = patch.tags {
            post.tags = tags;
        }
        post.version = patch.version;

        let updated = self.store.posts.update(&post).await.map_err(|e| {
            warn!(post_id = %post.id, version = post.version, error = %e, "post update rejected");
            e
        })?;
        info!(post_id = %updated.id, version = updated.version, "post updated");
        Ok(updated)
    }

    pub async fn delete(&self, post_id: Uuid) -> AppResult<()> {
        self.store.posts.delete(post_id).await?;
        info!(post_id = %post_id, "post deleted");
        Ok(())
    }

    /// Owners always pass; others must strictly outrank `required_role`.
    /// A `false` result is a denial, not an error.
    pub async fn check_ownership(
        &self,
        actor: &User,
        post: &Post,
        required_role: &str,
    ) -> AppResult<bool> {
        if post.user_id == actor.id {
            return Ok(true);
        }
        outranks(self.store.roles.as_ref(), actor, required_role).await
    }
}
