//! Header-keyed raw rows, as produced by a tabular reader.

use std::{convert::Infallible, fmt};

/// Column names recognised in the input file.
///
/// Matching against the header is ASCII case-insensitive, so `lastName` and
/// `lastname` address the same column.
pub mod columns {
  pub const FIRST_NAME: &str = "firstname";
  pub const LAST_NAME: &str = "lastname";
  pub const EMAIL: &str = "email";
  pub const AFFILIATION: &str = "affiliation";
  pub const COUNTRY: &str = "country";
  pub const USERNAME: &str = "username";
  pub const TEMP_PASSWORD: &str = "tempPassword";
  pub const ROLES: [&str; 4] = ["role1", "role2", "role3", "role4"];
  pub const START_DATE: &str = "start_date";
  pub const END_DATE: &str = "end_date";

  /// Columns that must be present in the header for a run to start.
  pub const REQUIRED: [&str; 4] = [FIRST_NAME, LAST_NAME, EMAIL, COUNTRY];
}

/// One data row paired positionally with the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
  /// 1-based line number in the source file (header = 1).
  pub line: u64,
  fields:   Vec<(String, String)>,
}

impl Row {
  pub fn new<I, K, V>(line: u64, fields: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      line,
      fields: fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect(),
    }
  }

  /// The cell under `column`, if the header has that column.
  pub fn get(&self, column: &str) -> Option<&str> {
    self
      .fields
      .iter()
      .find(|(name, _)| name.eq_ignore_ascii_case(column))
      .map(|(_, value)| value.as_str())
  }

  /// The cell under `column` when present and non-empty.
  pub fn non_empty(&self, column: &str) -> Option<&str> {
    self.get(column).filter(|v| !v.is_empty())
  }
}

/// A data row the reader could not pair with the header.
///
/// Reader errors implement this so a rejected row still reports its line and
/// whatever leading cells lined up with the header columns.
pub trait RejectedRow: fmt::Display {
  /// Line the row started on, when the reader knows it.
  fn line(&self) -> Option<u64>;

  /// The cells that pair positionally with the header, if any were read.
  fn partial(&self) -> Option<&Row>;
}

impl RejectedRow for Infallible {
  fn line(&self) -> Option<u64> { match *self {} }

  fn partial(&self) -> Option<&Row> { match *self {} }
}

/// Required columns absent from `header`, in declaration order.
pub fn missing_columns<'a, I>(header: I) -> Vec<&'static str>
where
  I: IntoIterator<Item = &'a str>,
{
  let header: Vec<&str> = header.into_iter().collect();
  columns::REQUIRED
    .into_iter()
    .filter(|required| !header.iter().any(|h| h.eq_ignore_ascii_case(required)))
    .collect()
}
