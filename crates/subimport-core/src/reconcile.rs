//! The reconciliation engine: create-or-update per record, with failures
//! isolated at the record boundary.
//!
//! Per record:
//!   look up user (username if given, else email)
//!     ├─ found     → extend or create subscription          → Updated
//!     └─ not found → allocate username, generate password,
//!                    resolve roles, create user with its groups,
//!                    create subscription                    → New
//!
//! Any error inside that flow becomes an `Error` outcome for that record
//! only; the batch always runs to the end.

use chrono::Utc;
use tracing::{info, warn};

use crate::{
  Error, Result,
  credentials::Credentials,
  directory::{Directory, DirectoryUser, Journal, NewSubscription, NewUser, UserId},
  outcome::{BatchResult, RecordOutcome, ReportRow, Status},
  record::{RecordOptions, SubscriberRecord},
  role::resolve_groups,
  row::{RejectedRow, Row},
  username::allocate_username,
};

/// Engine behaviour switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
  /// Collapse repeated role slots into one group assignment.
  pub dedupe_roles: bool,
}

/// The successful result of reconciling one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
  /// An existing user's subscription was extended or created.
  Updated { username: String },
  /// A user was provisioned; the credentials are reported back.
  New {
    username:      String,
    temp_password: String,
  },
}

/// Runs a batch of rows against one journal.
pub struct Reconciler<'a, D, C> {
  directory:      &'a D,
  credentials:    &'a C,
  journal:        Journal,
  record_options: RecordOptions,
  options:        ReconcileOptions,
}

impl<'a, D, C> Reconciler<'a, D, C>
where
  D: Directory,
  C: Credentials,
{
  /// Resolve `journal_path` and prepare a run.
  ///
  /// Fails with [`Error::ContextNotFound`] before any record is touched when
  /// the journal does not exist.
  pub async fn new(
    directory: &'a D,
    credentials: &'a C,
    journal_path: &str,
    record_options: RecordOptions,
    options: ReconcileOptions,
  ) -> Result<Self> {
    let journal = directory
      .journal_by_path(journal_path)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ContextNotFound(journal_path.to_string()))?;

    Ok(Self {
      directory,
      credentials,
      journal,
      record_options,
      options,
    })
  }

  pub fn journal(&self) -> &Journal { &self.journal }

  /// Reconcile every row in order. Never fails as a whole.
  ///
  /// Rows the reader could not pair with the header arrive as `Err` and are
  /// reported as failed records, keeping their line and any cells that still
  /// line up with the header.
  pub async fn run<I, E>(&self, rows: I) -> BatchResult
  where
    I: IntoIterator<Item = std::result::Result<Row, E>>,
    E: RejectedRow,
  {
    let mut batch = BatchResult::default();

    for row in rows {
      let outcome = match row {
        Ok(row) => self.process(&row).await,
        Err(rejected) => rejected_outcome(&rejected),
      };

      log_outcome(&outcome);
      batch.push(outcome);
    }

    let summary = batch.summary();
    info!(
      journal = %self.journal.path,
      total = summary.total,
      new = summary.new,
      updated = summary.updated,
      errors = summary.errors,
      "import finished"
    );
    batch
  }

  /// Validate every row without touching the directory. Valid records are
  /// reported as `Pending`.
  pub fn validate<I, E>(&self, rows: I) -> BatchResult
  where
    I: IntoIterator<Item = std::result::Result<Row, E>>,
    E: RejectedRow,
  {
    let mut batch = BatchResult::default();
    for row in rows {
      let outcome = match row {
        Ok(row) => match SubscriberRecord::from_row(&row, &self.record_options) {
          Ok(record) => RecordOutcome {
            line:   Some(record.line),
            report: ReportRow::from_record(&record, Status::Pending),
            error:  None,
          },
          Err(e) => RecordOutcome::failed(
            Some(row.line),
            ReportRow::from_row(&row, Status::Error),
            e.to_string(),
          ),
        },
        Err(rejected) => rejected_outcome(&rejected),
      };
      log_outcome(&outcome);
      batch.push(outcome);
    }
    batch
  }

  /// Build and reconcile one row, converting any failure into an outcome.
  async fn process(&self, row: &Row) -> RecordOutcome {
    let record = match SubscriberRecord::from_row(row, &self.record_options) {
      Ok(record) => record,
      Err(e) => {
        return RecordOutcome::failed(
          Some(row.line),
          ReportRow::from_row(row, Status::Error),
          e.to_string(),
        );
      }
    };

    match self.reconcile(&record).await {
      Ok(Reconciled::Updated { username }) => {
        let mut report = ReportRow::from_record(&record, Status::Updated);
        report.username = username;
        RecordOutcome {
          line: Some(record.line),
          report,
          error: None,
        }
      }
      Ok(Reconciled::New {
        username,
        temp_password,
      }) => {
        let mut report = ReportRow::from_record(&record, Status::New);
        report.username = username;
        report.temp_password = temp_password;
        RecordOutcome {
          line: Some(record.line),
          report,
          error: None,
        }
      }
      Err(e) => RecordOutcome::failed(
        Some(record.line),
        ReportRow::from_record(&record, Status::Error),
        e.to_string(),
      ),
    }
  }

  /// Decide create-vs-update for one validated record and carry it out.
  pub async fn reconcile(&self, record: &SubscriberRecord) -> Result<Reconciled> {
    match self.find_user(record).await? {
      Some(user) => {
        self.grant(user.user_id, record).await?;
        Ok(Reconciled::Updated {
          username: user.username,
        })
      }
      None => self.provision(record).await,
    }
  }

  async fn find_user(&self, record: &SubscriberRecord) -> Result<Option<DirectoryUser>> {
    let found = match &record.username {
      Some(username) => self.directory.user_by_username(username).await,
      None => self.directory.user_by_email(&record.email).await,
    };
    found.map_err(Error::store)
  }

  /// Extend the user's subscription to the record's end date, or create one.
  async fn grant(&self, user_id: UserId, record: &SubscriberRecord) -> Result<()> {
    let existing = self
      .directory
      .subscription_for(user_id, self.journal.journal_id)
      .await
      .map_err(Error::store)?;

    match existing {
      Some(subscription) => {
        self
          .directory
          .extend_subscription(subscription.subscription_id, record.end_date)
          .await
          .map_err(Error::store)?;
      }
      None => {
        self
          .directory
          .create_subscription(NewSubscription::active(
            self.journal.journal_id,
            user_id,
            record.subscription_type_id,
            record.start_date,
            record.end_date,
          ))
          .await
          .map_err(Error::store)?;
      }
    }
    Ok(())
  }

  /// Create a directory user for `record`, assign its groups and subscribe it.
  async fn provision(&self, record: &SubscriberRecord) -> Result<Reconciled> {
    let username = match &record.username {
      Some(username) => username.clone(),
      None => {
        let directory = self.directory;
        allocate_username(&record.first_name, &record.last_name, move |candidate| {
          async move {
            directory
              .user_by_username(&candidate)
              .await
              .map(|user| user.is_some())
              .map_err(Error::store)
          }
        })
        .await?
      }
    };

    let temp_password = record
      .temp_password
      .clone()
      .unwrap_or_else(|| self.credentials.generate_password());

    // Groups are resolved before anything is written so a missing group
    // leaves no half-provisioned account behind.
    let groups = resolve_groups(
      self.directory,
      &self.journal,
      &record.roles,
      self.options.dedupe_roles,
    )
    .await?;

    let password_hash = self
      .credentials
      .hash_password(&username, &temp_password)
      .map_err(|e| Error::Credentials(Box::new(e)))?;

    let locale = self.journal.primary_locale.clone();
    let new_user = NewUser {
      username: username.clone(),
      email: record.email.clone(),
      given_name: record.first_name.clone(),
      family_name: record.last_name.clone(),
      affiliation: record.affiliation.clone(),
      country: record.country.clone(),
      locales: vec![locale],
      password_hash,
      must_change_password: true,
      registered_at: Utc::now(),
    };

    // The account and its memberships land together. If the subscription
    // write below fails, the next run finds the account and creates it.
    let user = self
      .directory
      .create_user_with_groups(new_user, groups)
      .await
      .map_err(|e| Error::UserCreationFailed(Box::new(e)))?;

    self.grant(user.user_id, record).await?;

    Ok(Reconciled::New {
      username,
      temp_password,
    })
  }
}

/// Report a row the reader rejected, projecting the cells it did pair.
fn rejected_outcome<E: RejectedRow>(rejected: &E) -> RecordOutcome {
  let report = rejected
    .partial()
    .map(|row| ReportRow::from_row(row, Status::Error))
    .unwrap_or_default();
  RecordOutcome::failed(
    rejected.line(),
    report,
    Error::MalformedRow(rejected.to_string()).to_string(),
  )
}

fn log_outcome(outcome: &RecordOutcome) {
  let line = outcome.line.unwrap_or_default();
  match &outcome.error {
    Some(error) => warn!(
      line,
      email = %outcome.report.email,
      %error,
      "failed to process subscription"
    ),
    None => info!(
      line,
      email = %outcome.report.email,
      status = %outcome.status(),
      "processed subscriber"
    ),
  }
}
