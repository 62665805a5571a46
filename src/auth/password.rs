use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{error, warn};

const PHC_PREFIX: &str = "$argon2";
const MIN_PHC_LEN: usize = 50;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

/// `false` for a missing or unparseable digest; never errors.
pub fn verify_password(plain: &str, hash: Option<&str>) -> bool {
    let Some(hash) = hash else {
        return false;
    };
    let parsed = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(e) => {
            warn!(error = %e, "stored credential is not a valid argon2 hash");
            return false;
        }
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok()
}

/// Heuristic used to avoid hashing an already hashed value twice.
pub fn looks_hashed(value: &str) -> bool {
    value.starts_with(PHC_PREFIX) && value.len() >= MIN_PHC_LEN
}

/// The only way a credential should reach a repository.
pub fn into_stored_credential(value: &str) -> anyhow::Result<String> {
    if looks_hashed(value) {
        Ok(value.to_string())
    } else {
        hash_password(value)
    }
}
