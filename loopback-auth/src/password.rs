// Password storage and verification.

use crate::error::AuthResult;

/// Hash a password for storage with bcrypt at the given cost.
pub fn hash_password(plain: &str, cost: u32) -> AuthResult<String> {
    Ok(bcrypt::hash(plain, cost)?)
}

/// Check a candidate against a stored password.
///
/// Stored values that look like bcrypt hashes (`$2a$`, `$2b$`, `$2y$`) are
/// verified with bcrypt; anything else is a plaintext demo credential and is
/// compared directly.
pub fn verify_password(stored: &str, candidate: &str) -> bool {
    if stored.starts_with("$2") {
        match bcrypt::verify(candidate, stored) {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is unreadable");
                false
            }
        }
    } else {
        stored == candidate
    }
}
