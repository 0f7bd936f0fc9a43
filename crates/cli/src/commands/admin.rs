//! Administrator credential command.
//!
//! The storefront has no administrator table: the server reads
//! `ADMIN_EMAIL` and `ADMIN_PASSWORD_HASH` from its environment. This
//! command produces those two lines.
//!
//! # Usage
//!
//! ```bash
//! echo 'long passphrase' | pp-cli admin credential -e owner@example.com >> .env
//! ```

use std::io::BufRead;

use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher};
use pattupavadai_core::{Email, EmailError};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

/// Shortest administrator password accepted.
const MIN_PASSWORD_LEN: usize = 12;

/// Errors that can occur while building a credential.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password too short or missing.
    #[error("Password must be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,

    /// Reading stdin failed.
    #[error("Failed to read password: {0}")]
    Io(#[from] std::io::Error),

    /// Hashing failed.
    #[error("Failed to hash password: {0}")]
    Hash(String),
}

/// Read a password from stdin and print the administrator environment lines.
///
/// # Errors
///
/// Returns an error if the email is invalid, the password is too short,
/// or hashing fails.
pub fn credential(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = SecretString::from(line.trim_end_matches(['\r', '\n']).to_owned());

    let hash = hash_admin_password(&password)?;

    #[allow(clippy::print_stdout)]
    {
        println!("ADMIN_EMAIL={email}");
        println!("ADMIN_PASSWORD_HASH='{hash}'");
    }
    Ok(())
}

/// Hash an administrator password into an Argon2id PHC string.
fn hash_admin_password(password: &SecretString) -> Result<String, AdminError> {
    let password = password.expose_secret();
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminError::WeakPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AdminError::Hash(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn test_hash_verifies() {
        let password = SecretString::from("correct horse battery");
        let hash = hash_admin_password(&password).unwrap();
        assert!(hash.starts_with("$argon2id$"));

        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse battery", &parsed)
                .is_ok()
        );
    }

    #[test]
    fn test_short_password_rejected() {
        let password = SecretString::from("short");
        assert!(matches!(
            hash_admin_password(&password),
            Err(AdminError::WeakPassword)
        ));
    }
}
