// src/utils/hash.rs

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{QuizError, QuizResult};

/// Hashes a credential with Argon2id and a random salt.
pub fn hash_password(password: &str) -> QuizResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| QuizError::Invariant(format!("password hashing failed: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Checks a credential against a stored hash.
/// An unusable password (`None`) never verifies.
pub fn verify_password(password: &str, password_hash: Option<&str>) -> QuizResult<bool> {
    let Some(password_hash) = password_hash else {
        return Ok(false);
    };

    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| QuizError::Invariant(format!("stored password hash is malformed: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("StrongPass!123").unwrap();
        assert!(verify_password("StrongPass!123", Some(&hash)).unwrap());
        assert!(!verify_password("wrong", Some(&hash)).unwrap());
    }

    #[test]
    fn test_unusable_password_never_verifies() {
        assert!(!verify_password("anything", None).unwrap());
    }
}
