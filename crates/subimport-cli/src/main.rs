//! `subimport`: bulk subscriber import for a journal's user directory.
//!
//! # Usage
//!
//! ```text
//! subimport add-journal jdr --locale en
//! subimport import subscribers.csv jdr 3 report.csv
//! subimport --config ~/.config/subimport.toml import in.csv jdr 3 out.csv --dry-run
//! ```
//!
//! Every input row produces one report row (`New`, `Updated`, `Pending` or
//! `Error`). The process exits non-zero only for failures that stop the run
//! as a whole: an unreadable input, missing columns, an unknown journal or
//! an unwritable report.

mod commands;
mod credentials;
mod settings;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use commands::ImportArgs;
use settings::Settings;
use subimport_core::directory::SubscriptionTypeId;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(author, version, about = "Import subscribers into a journal's user directory")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "subimport.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Reconcile every row of INPUT against JOURNAL and write a report.
  Import {
    /// Delimited input file with a header row.
    input:             PathBuf,
    /// Path of the journal the subscriptions belong to.
    journal:           String,
    /// Subscription type id given to newly created subscriptions.
    subscription_type: SubscriptionTypeId,
    /// Where to write the outcome report.
    output:            PathBuf,

    /// Suffix every email with a test marker. Rows that also supply a
    /// username are still matched against that account.
    #[arg(long)]
    test: bool,

    /// Validate rows and write the report without touching the directory.
    #[arg(long)]
    dry_run: bool,
  },

  /// Register a journal with one default group per role.
  AddJournal {
    path: String,

    #[arg(long, default_value = "en")]
    locale: String,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = Settings::load(&cli.config)?;

  match cli.command {
    Command::Import {
      input,
      journal,
      subscription_type,
      output,
      test,
      dry_run,
    } => {
      let args = ImportArgs {
        input,
        journal,
        subscription_type,
        output,
        test,
        dry_run,
      };
      let summary = commands::import(&settings, &args).await?;
      println!("{summary}");
      println!("report written to {}", args.output.display());
    }
    Command::AddJournal { path, locale } => {
      let journal = commands::add_journal(&settings, &path, &locale).await?;
      println!("journal {:?} registered with id {}", journal.path, journal.journal_id);
    }
  }

  Ok(())
}
