use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,   // user ID
    pub iat: usize,  // issued at (unix timestamp)
    pub nbf: usize,  // not before
    pub exp: usize,  // expires at
    pub iss: String, // issuer
    pub aud: String, // audience
}
