//! Password hashing and session tokens
//!
//! Passwords are stored as `sha256(salt || password)` in hex with a random
//! per-user salt. Session tokens are random opaque strings.

use rand::distributions::Alphanumeric;
use rand::Rng;
use sha2::{Digest, Sha256};

use crate::models::Credentials;

const SALT_LEN: usize = 16;
const TOKEN_LEN: usize = 48;

/// Minimum accepted password length at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Random hex salt
pub fn generate_salt() -> String {
    let bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// SHA-256 of salt followed by password, as 64 hex chars
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Fresh credentials for a new password
pub fn new_credentials(password: &str) -> Credentials {
    let salt = generate_salt();
    Credentials {
        password_hash: hash_password(password, &salt),
        password_salt: salt,
    }
}

pub fn verify_password(password: &str, credentials: &Credentials) -> bool {
    let computed = hash_password(password, &credentials.password_salt);
    constant_time_eq(computed.as_bytes(), credentials.password_hash.as_bytes())
}

/// Opaque bearer token for a new session
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
