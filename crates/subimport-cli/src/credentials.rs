//! Argon2-backed credential service for provisioned accounts.

use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use rand_core::{OsRng, RngCore};
use subimport_core::credentials::Credentials;
use thiserror::Error;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of generated temporary passwords.
pub const PASSWORD_LEN: usize = 12;

#[derive(Debug, Error)]
#[error("argon2 error: {0}")]
pub struct HashError(String);

/// Hashes with argon2id defaults into a PHC string; generates passwords from
/// the OS random source.
#[derive(Default)]
pub struct Argon2Credentials {
  argon2: Argon2<'static>,
}

impl Credentials for Argon2Credentials {
  type Error = HashError;

  fn generate_password(&self) -> String {
    // Rejection sampling keeps every symbol equally likely.
    let limit = (u8::MAX as usize / ALPHABET.len() * ALPHABET.len()) as u8;
    let mut password = String::with_capacity(PASSWORD_LEN);
    let mut buf = [0u8; 32];

    while password.len() < PASSWORD_LEN {
      OsRng.fill_bytes(&mut buf);
      for &b in buf.iter().filter(|&&b| b < limit) {
        if password.len() == PASSWORD_LEN {
          break;
        }
        password.push(ALPHABET[b as usize % ALPHABET.len()] as char);
      }
    }
    password
  }

  fn hash_password(&self, _username: &str, password: &str) -> Result<String, HashError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = self
      .argon2
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| HashError(e.to_string()))?
      .to_string();
    Ok(hash)
  }
}
