//! Relational store adapter: shared error type, per-call deadlines and the
//! bundle of repository trait objects handed to services.

use std::{future::Future, sync::Arc, time::Duration};

use sqlx::PgPool;
use tracing::debug;

use crate::{
    comments::repo::{CommentStore, PgCommentStore},
    followers::repo::{FollowerStore, PgFollowerStore},
    posts::repo::{PgPostStore, PostStore},
    users::{
        repo::{PgUserStore, UserStore},
        roles::{PgRoleStore, RoleStore},
    },
};

#[cfg(test)]
pub mod memory;

const PG_UNIQUE_VIOLATION: &str = "23505";
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate username")]
    DuplicateUsername,
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("record already exists")]
    Conflict,
    #[error("version mismatch")]
    VersionConflict,
    #[error("store deadline exceeded")]
    Timeout,
    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Classify a driver error by SQLSTATE and constraint name.
    pub fn from_db(e: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = e {
            return Self::NotFound;
        }
        if let sqlx::Error::Database(db) = &e {
            let code = db.code();
            debug!(code = ?code, constraint = ?db.constraint(), "database error");
            match code.as_deref() {
                Some(PG_UNIQUE_VIOLATION) => {
                    return match db.constraint() {
                        Some("users_email_key") => Self::DuplicateEmail,
                        Some("users_username_key") => Self::DuplicateUsername,
                        _ => Self::Conflict,
                    };
                }
                Some(PG_FOREIGN_KEY_VIOLATION) => return Self::NotFound,
                _ => {}
            }
        }
        Self::Database(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Run one store operation under a fixed deadline.
///
/// Dropping an uncommitted `sqlx::Transaction` rolls it back, so a future
/// cancelled here never leaves a transaction open.
pub async fn with_deadline<T, F>(deadline: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(res) => res,
        Err(_) => Err(StoreError::Timeout),
    }
}

/// Repository handles for every entity owned by the relational store.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub comments: Arc<dyn CommentStore>,
    pub followers: Arc<dyn FollowerStore>,
    pub roles: Arc<dyn RoleStore>,
}

impl Storage {
    pub fn postgres(db: PgPool, query_timeout: Duration) -> Self {
        Self {
            users: Arc::new(PgUserStore::new(db.clone(), query_timeout)),
            posts: Arc::new(PgPostStore::new(db.clone(), query_timeout)),
            comments: Arc::new(PgCommentStore::new(db.clone(), query_timeout)),
            followers: Arc::new(PgFollowerStore::new(db.clone(), query_timeout)),
            roles: Arc::new(PgRoleStore::new(db, query_timeout)),
        }
    }
}
