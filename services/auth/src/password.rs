//! Initial password generation and argon2 hashing

use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::{Rng, distributions::Alphanumeric, seq::SliceRandom};
use thiserror::Error;

/// Password hashing errors
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),
}

/// Build an initial password for a new account.
///
/// The password mixes the first two characters of the first name, the first
/// two of the email, the last two of the mobile number and two random
/// alphanumerics, then shuffles the result.
pub fn generate_password(firstname: &str, email: &str, mobile: &str) -> String {
    let mut rng = rand::thread_rng();

    let mobile_chars: Vec<char> = mobile.chars().collect();
    let mut chars: Vec<char> = firstname
        .chars()
        .take(2)
        .chain(email.chars().take(2))
        .chain(mobile_chars[mobile_chars.len().saturating_sub(2)..].iter().copied())
        .collect();
    chars.extend((0..2).map(|_| rng.sample(Alphanumeric) as char));

    chars.shuffle(&mut rng);
    chars.into_iter().collect()
}

/// Hash a plaintext password into an argon2 PHC string
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash =
        PasswordHash::new(password_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}
