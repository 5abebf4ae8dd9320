//! Request signing for the marketplace partner API.
//!
//! `sign = hex(sha256(partner_id + path + timestamp + secret_key))`

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};

/// Compute the lowercase hex signature for one request.
pub fn sign(partner_id: &str, path: &str, timestamp: i64, secret_key: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(partner_id.as_bytes());
    hasher.update(path.as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(secret_key.expose_secret().as_bytes());
    format!("{:x}", hasher.finalize())
}
