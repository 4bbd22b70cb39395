//! One-time activation tokens. Only the SHA-256 of a token is ever stored.

use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Fresh token: (plaintext for the activation link, hex hash for the store).
pub fn generate() -> (String, String) {
    let plain = Uuid::new_v4().to_string();
    let hash = hash_token(&plain);
    (plain, hash)
}

pub fn hash_token(plain: &str) -> String {
    hex::encode(Sha256::digest(plain.as_bytes()))
}
