//! Delimited-text codec for subscriber imports.
//!
//! Reads an input file into header-keyed [`Row`]s and writes the outcome
//! report. Pure synchronous; no database dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use subimport_csv::read_path;
//!
//! let table = read_path("subscribers.csv", b',').unwrap();
//! println!("{} columns, {} rows", table.header.len(), table.rows.len());
//! ```

pub mod error;
mod read;
mod write;

pub use error::{Error, Result};
pub use read::{normalize_cell, read_from, read_path};
pub use write::{REPORT_HEADER, write_report, write_report_to};

use subimport_core::row::Row;

// ─── Public types ───────────────────────────────────────────────────────────

/// A parsed input file.
#[derive(Debug)]
pub struct Table {
  /// Normalised header names, in file order.
  pub header: Vec<String>,
  /// One entry per non-blank data row, in file order. Rows whose width
  /// differs from the header are [`Error::FieldCount`] in place.
  pub rows:   Vec<Result<Row>>,
}

// ─── Round-trip test ─────────────────────────────────────────────────────────

#[cfg(test)]
mod roundtrip_tests {
  use subimport_core::outcome::{ReportRow, Status};

  use super::*;

  #[test]
  fn report_reads_back_through_the_reader() {
    let rows = vec![
      ReportRow {
        first_name:    "Jane".into(),
        last_name:     "Smith".into(),
        email:         "jane@example.org".into(),
        username:      "smithj2".into(),
        temp_password: "Xk3, \"quoted\"".into(),
        country:       "CA".into(),
        status:        Status::New,
      },
      ReportRow {
        first_name:    "John".into(),
        last_name:     "Doe".into(),
        email:         "john@example.org".into(),
        username:      "jdoe".into(),
        temp_password: String::new(),
        country:       "US".into(),
        status:        Status::Updated,
      },
      ReportRow {
        first_name: "Bad".into(),
        email:      "bad@example.org".into(),
        status:     Status::Error,
        ..ReportRow::default()
      },
    ];

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.csv");
    write_report(&path, &rows, b',').unwrap();

    let table = read_path(&path, b',').unwrap();
    assert_eq!(table.header, REPORT_HEADER.map(String::from).to_vec());
    assert_eq!(table.rows.len(), rows.len());

    for (written, read) in rows.iter().zip(&table.rows) {
      let read = read.as_ref().unwrap();
      assert_eq!(read.get("firstname"), Some(written.first_name.as_str()));
      assert_eq!(read.get("lastname"), Some(written.last_name.as_str()));
      assert_eq!(read.get("email"), Some(written.email.as_str()));
      assert_eq!(read.get("username"), Some(written.username.as_str()));
      assert_eq!(read.get("tempPassword"), Some(written.temp_password.as_str()));
      assert_eq!(read.get("country"), Some(written.country.as_str()));
      assert_eq!(read.get("status"), Some(written.status.to_string().as_str()));
    }
  }
}
