//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates are `YYYY-MM-DD`, locale
//! lists are compact JSON arrays.

use chrono::{DateTime, NaiveDate, Utc};
use subimport_core::{
  directory::{DirectoryUser, Journal, Subscription, SubscriptionStatus},
  role::Role,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ──────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── SubscriptionStatus ─────────────────────────────────────────────────────

pub fn encode_status(s: SubscriptionStatus) -> &'static str {
  match s {
    SubscriptionStatus::Active => "active",
    SubscriptionStatus::NeedsInformation => "needs_information",
    SubscriptionStatus::NeedsApproval => "needs_approval",
    SubscriptionStatus::AwaitingPayment => "awaiting_payment",
    SubscriptionStatus::Other => "other",
  }
}

pub fn decode_status(s: &str) -> Result<SubscriptionStatus> {
  match s {
    "active" => Ok(SubscriptionStatus::Active),
    "needs_information" => Ok(SubscriptionStatus::NeedsInformation),
    "needs_approval" => Ok(SubscriptionStatus::NeedsApproval),
    "awaiting_payment" => Ok(SubscriptionStatus::AwaitingPayment),
    "other" => Ok(SubscriptionStatus::Other),
    other => Err(Error::UnknownStatus(other.to_string())),
  }
}

// ─── Role ────────────────────────────────────────────────────────────────────

pub fn encode_role(r: Role) -> String { r.to_string() }

pub fn decode_role(s: &str) -> Result<Role> {
  s.parse().map_err(|_| Error::UnknownRole(s.to_string()))
}

// ─── Locales ─────────────────────────────────────────────────────────────────

pub fn encode_locales(locales: &[String]) -> Result<String> {
  Ok(serde_json::to_string(locales)?)
}

pub fn decode_locales(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub const JOURNAL_COLUMNS: &str = "journal_id, path, primary_locale";

pub fn journal_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Journal> {
  Ok(Journal {
    journal_id:     row.get(0)?,
    path:           row.get(1)?,
    primary_locale: row.get(2)?,
  })
}

pub const USER_COLUMNS: &str = "user_id, username, email, given_name, family_name, affiliation, \
                                country, locales, must_change_password, date_registered";

/// Raw values read directly from a `users` row.
pub struct RawUser {
  pub user_id:              i64,
  pub username:             String,
  pub email:                String,
  pub given_name:           String,
  pub family_name:          String,
  pub affiliation:          Option<String>,
  pub country:              String,
  pub locales:              String,
  pub must_change_password: bool,
  pub date_registered:      String,
}

impl RawUser {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:              row.get(0)?,
      username:             row.get(1)?,
      email:                row.get(2)?,
      given_name:           row.get(3)?,
      family_name:          row.get(4)?,
      affiliation:          row.get(5)?,
      country:              row.get(6)?,
      locales:              row.get(7)?,
      must_change_password: row.get(8)?,
      date_registered:      row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<DirectoryUser> {
    Ok(DirectoryUser {
      user_id:              self.user_id,
      username:             self.username,
      email:                self.email,
      given_name:           self.given_name,
      family_name:          self.family_name,
      affiliation:          self.affiliation,
      country:              self.country,
      locales:              decode_locales(&self.locales)?,
      must_change_password: self.must_change_password,
      registered_at:        decode_dt(&self.date_registered)?,
    })
  }
}

pub const SUBSCRIPTION_COLUMNS: &str = "subscription_id, journal_id, user_id, type_id, date_start, \
                                        date_end, status, membership, reference_number, notes";

/// Raw values read directly from a `subscriptions` row.
pub struct RawSubscription {
  pub subscription_id:  i64,
  pub journal_id:       i64,
  pub user_id:          i64,
  pub type_id:          i64,
  pub date_start:       String,
  pub date_end:         String,
  pub status:           String,
  pub membership:       Option<String>,
  pub reference_number: Option<String>,
  pub notes:            Option<String>,
}

impl RawSubscription {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subscription_id:  row.get(0)?,
      journal_id:       row.get(1)?,
      user_id:          row.get(2)?,
      type_id:          row.get(3)?,
      date_start:       row.get(4)?,
      date_end:         row.get(5)?,
      status:           row.get(6)?,
      membership:       row.get(7)?,
      reference_number: row.get(8)?,
      notes:            row.get(9)?,
    })
  }

  pub fn into_subscription(self) -> Result<Subscription> {
    Ok(Subscription {
      subscription_id:  self.subscription_id,
      journal_id:       self.journal_id,
      user_id:          self.user_id,
      type_id:          self.type_id,
      date_start:       decode_date(&self.date_start)?,
      date_end:         decode_date(&self.date_end)?,
      status:           decode_status(&self.status)?,
      membership:       self.membership,
      reference_number: self.reference_number,
      notes:            self.notes,
    })
  }
}
