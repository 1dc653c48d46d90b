//! Error types for the subimport-csv reader and writer.

use std::{io, path::PathBuf};

use subimport_core::row::{RejectedRow, Row};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("input file does not exist: {}", .0.display())]
  NotFound(PathBuf),

  #[error("input file {} is not readable: {source}", path.display())]
  NotReadable { path: PathBuf, source: io::Error },

  #[error("cannot write report to {}: {source}", path.display())]
  NotWritable { path: PathBuf, source: io::Error },

  #[error("duplicate column {0:?} in header")]
  DuplicateColumn(String),

  /// A data row whose width differs from the header's. Reported per row.
  ///
  /// `row` holds the cells that pair with a header column by position.
  #[error("line {line}: expected {expected} fields, found {found}")]
  FieldCount {
    line:     u64,
    expected: usize,
    found:    usize,
    row:      Row,
  },

  #[error("csv error: {0}")]
  Csv(#[from] csv::Error),

  #[error("io error: {0}")]
  Io(#[from] io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl RejectedRow for Error {
  fn line(&self) -> Option<u64> {
    match self {
      Error::FieldCount { line, .. } => Some(*line),
      Error::Csv(e) => e.position().map(|p| p.line()),
      _ => None,
    }
  }

  fn partial(&self) -> Option<&Row> {
    match self {
      Error::FieldCount { row, .. } => Some(row),
      _ => None,
    }
  }
}
