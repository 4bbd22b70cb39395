use serde::Deserialize;

use crate::{error::AppResult, validation::Validator};

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

impl CreateCommentRequest {
    pub fn validate(self, v: &Validator) -> AppResult<Self> {
        v.length("content", &self.content, 1, 1000)?;
        Ok(self)
    }
}
