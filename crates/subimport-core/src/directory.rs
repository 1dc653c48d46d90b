//! The `Directory` trait and the external entities it exposes.
//!
//! The trait is implemented by storage backends (e.g.
//! `subimport-store-sqlite`). The reconciliation engine depends on this
//! abstraction only; it never locates its own store.

use std::future::Future;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::role::Role;

pub type JournalId = i64;
pub type UserId = i64;
pub type GroupId = i64;
pub type SubscriptionId = i64;
pub type SubscriptionTypeId = i64;

// ─── Journal ─────────────────────────────────────────────────────────────────

/// The publication scope subscriptions belong to. Read-only here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Journal {
  pub journal_id:     JournalId,
  pub path:           String,
  /// Locale under which new users' names are recorded.
  pub primary_locale: String,
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// An account in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryUser {
  pub user_id:              UserId,
  pub username:             String,
  pub email:                String,
  pub given_name:           String,
  pub family_name:          String,
  pub affiliation:          Option<String>,
  pub country:              String,
  pub locales:              Vec<String>,
  pub must_change_password: bool,
  pub registered_at:        DateTime<Utc>,
}

/// Input to [`Directory::create_user`]. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:             String,
  pub email:                String,
  pub given_name:           String,
  pub family_name:          String,
  pub affiliation:          Option<String>,
  pub country:              String,
  pub locales:              Vec<String>,
  /// Opaque hash produced by a [`Credentials`](crate::credentials::Credentials)
  /// implementation.
  pub password_hash:        String,
  pub must_change_password: bool,
  pub registered_at:        DateTime<Utc>,
}

// ─── Subscriptions ───────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
  #[default]
  Active,
  NeedsInformation,
  NeedsApproval,
  AwaitingPayment,
  Other,
}

/// An individual subscription, unique per (user, journal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
  pub subscription_id:  SubscriptionId,
  pub journal_id:       JournalId,
  pub user_id:          UserId,
  pub type_id:          SubscriptionTypeId,
  pub date_start:       NaiveDate,
  pub date_end:         NaiveDate,
  pub status:           SubscriptionStatus,
  pub membership:       Option<String>,
  pub reference_number: Option<String>,
  pub notes:            Option<String>,
}

/// Input to [`Directory::create_subscription`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSubscription {
  pub journal_id:       JournalId,
  pub user_id:          UserId,
  pub type_id:          SubscriptionTypeId,
  pub date_start:       NaiveDate,
  pub date_end:         NaiveDate,
  pub status:           SubscriptionStatus,
  pub membership:       Option<String>,
  pub reference_number: Option<String>,
  pub notes:            Option<String>,
}

impl NewSubscription {
  /// An active subscription with no membership, reference number or notes.
  pub fn active(
    journal_id: JournalId,
    user_id: UserId,
    type_id: SubscriptionTypeId,
    date_start: NaiveDate,
    date_end: NaiveDate,
  ) -> Self {
    Self {
      journal_id,
      user_id,
      type_id,
      date_start,
      date_end,
      status: SubscriptionStatus::Active,
      membership: None,
      reference_number: None,
      notes: None,
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the host's user, group and subscription store.
///
/// Implementations serialize their own writes; callers never lock.
pub trait Directory: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Journals and groups ───────────────────────────────────────────────

  /// Resolve a journal by its URL path. Returns `None` if unknown.
  fn journal_by_path<'a>(
    &'a self,
    path: &'a str,
  ) -> impl Future<Output = Result<Option<Journal>, Self::Error>> + Send + 'a;

  /// The default user group for `role` within a journal, if one exists.
  fn default_group_for_role(
    &self,
    journal_id: JournalId,
    role: Role,
  ) -> impl Future<Output = Result<Option<GroupId>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  fn user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<DirectoryUser>, Self::Error>> + Send + 'a;

  fn user_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<DirectoryUser>, Self::Error>> + Send + 'a;

  /// Persist a new user and return it with its assigned id.
  ///
  /// Returns an error if the username or email is already taken.
  fn create_user(
    &self,
    user: NewUser,
  ) -> impl Future<Output = Result<DirectoryUser, Self::Error>> + Send + '_;

  /// Persist a new user and its group memberships as one unit.
  ///
  /// Either the account and every membership are written, or nothing is.
  fn create_user_with_groups(
    &self,
    user: NewUser,
    groups: Vec<GroupId>,
  ) -> impl Future<Output = Result<DirectoryUser, Self::Error>> + Send + '_;

  fn assign_user_to_group(
    &self,
    user_id: UserId,
    group_id: GroupId,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Subscriptions ─────────────────────────────────────────────────────

  /// The subscription held by `user_id` in `journal_id`, if any.
  fn subscription_for(
    &self,
    user_id: UserId,
    journal_id: JournalId,
  ) -> impl Future<Output = Result<Option<Subscription>, Self::Error>> + Send + '_;

  fn create_subscription(
    &self,
    input: NewSubscription,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;

  /// Set the end date of an existing subscription. No other field changes.
  fn extend_subscription(
    &self,
    subscription_id: SubscriptionId,
    date_end: NaiveDate,
  ) -> impl Future<Output = Result<Subscription, Self::Error>> + Send + '_;
}
