//! Error types for `subimport-core`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::role::Role;

/// Boxed error used to carry backend failures across the port traits.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The journal path given for the run does not resolve. Fatal.
  #[error("journal not found: {0}")]
  ContextNotFound(String),

  #[error("required field {0:?} is missing")]
  MissingField(&'static str),

  #[error("invalid date in {field}: {value:?} does not match {format:?}")]
  InvalidDate {
    field:  &'static str,
    value:  String,
    format: String,
  },

  #[error("subscription start {start} is after its end {end}")]
  DatesOutOfOrder { start: NaiveDate, end: NaiveDate },

  #[error("invalid role {0:?}; expected Reader, Author or Reviewer")]
  InvalidRole(String),

  #[error("journal {journal:?} has no default group for role {role}")]
  GroupNotFound { role: Role, journal: String },

  #[error("no free username left for base {0:?}")]
  UsernameExhausted(String),

  #[error("user creation failed: {0}")]
  UserCreationFailed(#[source] BoxError),

  #[error("credential error: {0}")]
  Credentials(#[source] BoxError),

  #[error("malformed row: {0}")]
  MalformedRow(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl Error {
  /// Wrap a [`Directory`](crate::directory::Directory) backend error.
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
