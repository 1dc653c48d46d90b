//! Runtime settings, layered from an optional TOML file and `SUBIMPORT_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use serde::Deserialize;
use subimport_core::record::DEFAULT_DATE_FORMAT;

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Settings {
  /// SQLite directory file. A leading `~/` is expanded.
  pub store_path:   PathBuf,
  /// chrono `strftime` format for `start_date` and `end_date`.
  pub date_format:  String,
  pub delimiter:    char,
  /// Assign each distinct role once per record.
  pub dedupe_roles: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      store_path:   PathBuf::from("subimport.db"),
      date_format:  DEFAULT_DATE_FORMAT.to_string(),
      delimiter:    ',',
      dedupe_roles: false,
    }
  }
}

impl Settings {
  /// Load settings from `path` (if it exists) and the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let raw = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SUBIMPORT"))
      .build()
      .context("failed to read config file")?;

    let mut settings: Settings = raw
      .try_deserialize()
      .context("failed to deserialise settings")?;
    settings.store_path = expand_tilde(&settings.store_path);
    Ok(settings)
  }

  /// The delimiter as the single byte the csv reader expects.
  pub fn delimiter_byte(&self) -> anyhow::Result<u8> {
    if !self.delimiter.is_ascii() {
      bail!("delimiter {:?} is not a single ASCII character", self.delimiter);
    }
    Ok(self.delimiter as u8)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
