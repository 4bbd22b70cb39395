use serde::Deserialize;

use crate::{error::AppResult, validation::Validator};

pub const MAX_TITLE_LEN: usize = 100;
pub const MAX_CONTENT_LEN: usize = 1000;
pub const MAX_TAGS: usize = 5;

/// Request body for a new post.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CreatePostRequest {
    pub fn validate(self, v: &Validator) -> AppResult<Self> {
        v.length("title", &self.title, 1, MAX_TITLE_LEN)?;
        v.length("content", &self.content, 1, MAX_CONTENT_LEN)?;
        v.max_items("tags", &self.tags, MAX_TAGS)?;
        Ok(self)
    }
}

/// Partial update. `version` is the version the caller last read.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
    pub version: i64,
}

impl UpdatePostRequest {
    pub fn validate(self, v: &Validator) -> AppResult<Self> {
        if let Some(title) = &self.title {
            v.length("title", title, 1, MAX_TITLE_LEN)?;
        }
        if let Some(content) = &self.content {
            v.length("content", content, 1, MAX_CONTENT_LEN)?;
        }
        if let Some(tags) = &self.tags {
            v.max_items("tags", tags, MAX_TAGS)?;
        }
        v.range("version", self.version, 0, i64::MAX)?;
        Ok(self)
    }
}
