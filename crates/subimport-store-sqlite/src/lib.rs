//! SQLite backend for the subscriber import directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The schema is a compact reference
//! layout for journals, default role groups, users and subscriptions.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteDirectory;
