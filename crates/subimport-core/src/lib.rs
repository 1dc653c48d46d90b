//! Core types, ports and the reconciliation engine for subscriber imports.
//!
//! This crate is deliberately free of file-format and database dependencies.
//! Tabular input arrives as [`row::Row`]s, the user directory is reached
//! through the [`directory::Directory`] trait, and password handling goes
//! through [`credentials::Credentials`].

pub mod credentials;
pub mod directory;
pub mod error;
pub mod outcome;
pub mod reconcile;
pub mod record;
pub mod role;
pub mod row;
pub mod username;

pub use error::{BoxError, Error, Result};

#[cfg(test)]
mod testing;
