//! The opaque credential service used when provisioning accounts.

/// Generates and hashes temporary passwords for new directory users.
pub trait Credentials: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// A fresh temporary password for a row that did not supply one.
  fn generate_password(&self) -> String;

  /// Hash `password` for storage on the account named `username`.
  fn hash_password(
    &self,
    username: &str,
    password: &str,
  ) -> Result<String, Self::Error>;
}
