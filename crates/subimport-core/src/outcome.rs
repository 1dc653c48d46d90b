//! Per-record outcomes and the batch result handed to the report writer.

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{
  record::SubscriberRecord,
  row::{Row, columns},
};

/// Terminal (or, for dry runs, pending) state of one input record.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Display,
  EnumString,
  Serialize,
  Deserialize,
)]
pub enum Status {
  /// Validated but not reconciled.
  #[default]
  Pending,
  /// A directory user was created and subscribed.
  New,
  /// An existing user's subscription was created or extended.
  Updated,
  Error,
}

/// The report projection of one record, in output column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
  #[serde(rename = "firstname")]
  pub first_name:    String,
  #[serde(rename = "lastname")]
  pub last_name:     String,
  pub email:         String,
  pub username:      String,
  #[serde(rename = "tempPassword")]
  pub temp_password: String,
  pub country:       String,
  pub status:        Status,
}

impl ReportRow {
  /// Project a raw row, for records that never validated.
  pub fn from_row(row: &Row, status: Status) -> Self {
    let cell = |column| row.get(column).unwrap_or_default().to_string();
    Self {
      first_name: cell(columns::FIRST_NAME),
      last_name: cell(columns::LAST_NAME),
      email: cell(columns::EMAIL),
      username: cell(columns::USERNAME),
      temp_password: cell(columns::TEMP_PASSWORD),
      country: cell(columns::COUNTRY),
      status,
    }
  }

  pub fn from_record(record: &SubscriberRecord, status: Status) -> Self {
    Self {
      first_name: record.first_name.clone(),
      last_name: record.last_name.clone(),
      email: record.email.clone(),
      username: record.username.clone().unwrap_or_default(),
      temp_password: record.temp_password.clone().unwrap_or_default(),
      country: record.country.clone(),
      status,
    }
  }
}

/// What happened to one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOutcome {
  /// Source line, when the row could be read at all.
  pub line:   Option<u64>,
  pub report: ReportRow,
  /// Human-readable failure; set exactly when the status is `Error`.
  pub error:  Option<String>,
}

impl RecordOutcome {
  pub fn status(&self) -> Status { self.report.status }

  pub(crate) fn failed(line: Option<u64>, mut report: ReportRow, error: String) -> Self {
    report.status = Status::Error;
    Self {
      line,
      report,
      error: Some(error),
    }
  }
}

/// Counts over a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
  pub total:   usize,
  pub new:     usize,
  pub updated: usize,
  pub pending: usize,
  pub errors:  usize,
}

impl fmt::Display for Summary {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} records: {} new, {} updated, {} errors",
      self.total, self.new, self.updated, self.errors
    )?;
    if self.pending > 0 {
      write!(f, ", {} pending", self.pending)?;
    }
    Ok(())
  }
}

/// Every record's outcome in input order, with the failed and new-user
/// subsets tracked by index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
  pub outcomes: Vec<RecordOutcome>,
  failed:       Vec<usize>,
  new_users:    Vec<usize>,
}

impl BatchResult {
  pub(crate) fn push(&mut self, outcome: RecordOutcome) {
    let index = self.outcomes.len();
    match outcome.status() {
      Status::Error => self.failed.push(index),
      Status::New => self.new_users.push(index),
      Status::Pending | Status::Updated => {}
    }
    self.outcomes.push(outcome);
  }

  pub fn failed(&self) -> impl Iterator<Item = &RecordOutcome> {
    self.failed.iter().map(|&i| &self.outcomes[i])
  }

  pub fn new_users(&self) -> impl Iterator<Item = &RecordOutcome> {
    self.new_users.iter().map(|&i| &self.outcomes[i])
  }

  /// Report rows in input order.
  pub fn report(&self) -> impl Iterator<Item = &ReportRow> {
    self.outcomes.iter().map(|o| &o.report)
  }

  pub fn summary(&self) -> Summary {
    let mut summary = Summary {
      total: self.outcomes.len(),
      ..Summary::default()
    };
    for outcome in &self.outcomes {
      match outcome.status() {
        Status::Pending => summary.pending += 1,
        Status::New => summary.new += 1,
        Status::Updated => summary.updated += 1,
        Status::Error => summary.errors += 1,
      }
    }
    summary
  }
}
