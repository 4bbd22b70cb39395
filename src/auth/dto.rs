use serde::{Deserialize, Serialize};

use crate::{error::AppResult, users::repo_types::User, validation::Validator};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Normalizes the email and checks every field before any store call.
    pub fn validate(mut self, v: &Validator) -> AppResult<Self> {
        self.username = self.username.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        v.length("username", &self.username, 1, 100)?;
        v.email("email", &self.email)?;
        v.length("password", &self.password, 3, 72)?;
        Ok(self)
    }
}

/// Request body for token issuance.
#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub email: String,
    pub password: String,
}

impl TokenRequest {
    pub fn validate(mut self, v: &Validator) -> AppResult<Self> {
        self.email = self.email.trim().to_lowercase();
        v.email("email", &self.email)?;
        v.length("password", &self.password, 3, 72)?;
        Ok(self)
    }
}

/// Response returned after registration.
#[derive(Debug, Serialize)]
pub struct UserWithToken {
    pub user: User,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
}
