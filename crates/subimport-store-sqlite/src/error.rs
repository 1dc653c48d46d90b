//! Error type for `subimport-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("unknown subscription status: {0:?}")]
  UnknownStatus(String),

  #[error("unknown role: {0:?}")]
  UnknownRole(String),

  #[error("journal already exists: {0}")]
  JournalExists(String),

  #[error("subscription not found: {0}")]
  SubscriptionNotFound(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
