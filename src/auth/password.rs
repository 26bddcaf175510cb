use anyhow::anyhow;
use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

lazy_static! {
    /// Stand-in hash verified when the login email matches no user.
    static ref UNKNOWN_USER_HASH: Option<String> =
        hash_password("studyplanner-unknown-user").ok();
}

/// Argon2id PHC string for `plain`, salted from the OS RNG.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow!("hash password: {}", e)
        })
}

/// Checks a login attempt. `stored` is the user's hash, or `None` when the
/// email is unknown; that case still runs one verification and yields `false`,
/// so both failures cost about the same.
pub fn verify_password(plain: &str, stored: Option<&str>) -> anyhow::Result<bool> {
    match stored {
        Some(phc) => check_phc(plain, phc),
        None => {
            if let Some(phc) = UNKNOWN_USER_HASH.as_deref() {
                let _ = check_phc(plain, phc);
            }
            Ok(false)
        }
    }
}

fn check_phc(plain: &str, phc: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(phc).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow!("parse password hash: {}", e)
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("verify password: {}", e)),
    }
}
