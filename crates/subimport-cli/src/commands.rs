//! Subcommand implementations.

use std::path::PathBuf;

use anyhow::Context as _;
use subimport_core::{
  directory::{Journal, SubscriptionTypeId},
  outcome::Summary,
  reconcile::{ReconcileOptions, Reconciler},
  record::RecordOptions,
  row::missing_columns,
};
use subimport_csv::{read_path, write_report};
use subimport_store_sqlite::SqliteDirectory;
use thiserror::Error;
use tracing::info;

use crate::{credentials::Argon2Credentials, settings::Settings};

#[derive(Debug, Error)]
pub enum ImportError {
  #[error("input is missing required column(s): {}", .0.join(", "))]
  MissingColumns(Vec<&'static str>),
}

/// Arguments of one import run.
#[derive(Debug, Clone)]
pub struct ImportArgs {
  pub input:             PathBuf,
  pub journal:           String,
  pub subscription_type: SubscriptionTypeId,
  pub output:            PathBuf,
  pub test:              bool,
  pub dry_run:           bool,
}

/// Read the input, reconcile every row and write the report.
///
/// Everything that fails here before the first row is processed, and any
/// failure to write the report, is fatal. Per-row failures end up in the
/// report instead.
pub async fn import(settings: &Settings, args: &ImportArgs) -> anyhow::Result<Summary> {
  let delimiter = settings.delimiter_byte()?;

  let table = read_path(&args.input, delimiter)
    .with_context(|| format!("failed to read {}", args.input.display()))?;

  let missing = missing_columns(table.header.iter().map(String::as_str));
  if !missing.is_empty() {
    return Err(ImportError::MissingColumns(missing).into());
  }

  let store = SqliteDirectory::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;
  let credentials = Argon2Credentials::default();

  let record_options = RecordOptions {
    subscription_type_id: args.subscription_type,
    date_format:          settings.date_format.clone(),
    test_mode:            args.test,
  };
  let options = ReconcileOptions {
    dedupe_roles: settings.dedupe_roles,
  };

  let reconciler = Reconciler::new(&store, &credentials, &args.journal, record_options, options)
    .await
    .context("cannot start import")?;

  info!(
    journal = %args.journal,
    journal_id = reconciler.journal().journal_id,
    rows = table.rows.len(),
    dry_run = args.dry_run,
    "starting import"
  );

  let batch = if args.dry_run {
    reconciler.validate(table.rows)
  } else {
    reconciler.run(table.rows).await
  };

  write_report(&args.output, batch.report(), delimiter)
    .with_context(|| format!("failed to write report to {}", args.output.display()))?;

  Ok(batch.summary())
}

/// Register a journal with a default group for every role.
pub async fn add_journal(settings: &Settings, path: &str, locale: &str) -> anyhow::Result<Journal> {
  let store = SqliteDirectory::open(&settings.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", settings.store_path))?;

  let journal = store
    .add_journal_with_default_groups(path, locale)
    .await
    .with_context(|| format!("failed to add journal {path:?}"))?;

  info!(journal_id = journal.journal_id, path, "journal registered");
  Ok(journal)
}
