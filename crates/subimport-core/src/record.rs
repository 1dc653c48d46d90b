//! Validated subscriber records built from raw rows.

use chrono::NaiveDate;

use crate::{
  Error, Result,
  directory::SubscriptionTypeId,
  role::RoleSet,
  row::{Row, columns},
};

/// Default chrono format for `start_date` / `end_date` cells.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Appended to every email in test mode so rehearsal runs never match or
/// create real accounts.
pub const TEST_EMAIL_MARKER: &str = ".subimport-test";

/// Batch-wide inputs to record construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
  pub subscription_type_id: SubscriptionTypeId,
  /// chrono `strftime` format used for both date columns.
  pub date_format:          String,
  pub test_mode:            bool,
}

impl RecordOptions {
  pub fn new(subscription_type_id: SubscriptionTypeId) -> Self {
    Self {
      subscription_type_id,
      date_format: DEFAULT_DATE_FORMAT.to_string(),
      test_mode: false,
    }
  }
}

/// One validated row of import intent. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberRecord {
  pub line:                 u64,
  pub first_name:           String,
  pub last_name:            String,
  pub email:                String,
  pub affiliation:          Option<String>,
  pub country:              String,
  /// `None` triggers username allocation for new users.
  pub username:             Option<String>,
  /// `None` triggers password generation for new users.
  pub temp_password:        Option<String>,
  pub roles:                RoleSet,
  pub start_date:           NaiveDate,
  pub end_date:             NaiveDate,
  pub subscription_type_id: SubscriptionTypeId,
}

impl SubscriberRecord {
  /// Validate `row` into a record. Performs no directory access.
  pub fn from_row(row: &Row, options: &RecordOptions) -> Result<Self> {
    let first_name = required(row, columns::FIRST_NAME)?;
    let last_name = required(row, columns::LAST_NAME)?;
    let mut email = required(row, columns::EMAIL)?;
    let country = required(row, columns::COUNTRY)?;

    if options.test_mode {
      email.push_str(TEST_EMAIL_MARKER);
    }

    let roles = RoleSet::from_row(row)?;

    let start_date = date(row, columns::START_DATE, &options.date_format)?;
    let end_date = date(row, columns::END_DATE, &options.date_format)?;
    if start_date > end_date {
      return Err(Error::DatesOutOfOrder {
        start: start_date,
        end:   end_date,
      });
    }

    Ok(Self {
      line: row.line,
      first_name,
      last_name,
      email,
      affiliation: optional(row, columns::AFFILIATION),
      country,
      username: optional(row, columns::USERNAME),
      temp_password: optional(row, columns::TEMP_PASSWORD),
      roles,
      start_date,
      end_date,
      subscription_type_id: options.subscription_type_id,
    })
  }
}

fn required(row: &Row, column: &'static str) -> Result<String> {
  row
    .non_empty(column)
    .map(str::to_string)
    .ok_or(Error::MissingField(column))
}

fn optional(row: &Row, column: &str) -> Option<String> {
  row.non_empty(column).map(str::to_string)
}

fn date(row: &Row, column: &'static str, format: &str) -> Result<NaiveDate> {
  let value = row.non_empty(column).ok_or(Error::MissingField(column))?;
  NaiveDate::parse_from_str(value, format).map_err(|_| Error::InvalidDate {
    field:  column,
    value:  value.to_string(),
    format: format.to_string(),
  })
}
