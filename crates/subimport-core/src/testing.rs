//! In-memory [`Directory`] and deterministic [`Credentials`] for engine tests.

use std::{convert::Infallible, fmt, sync::Mutex};

use chrono::{NaiveDate, TimeZone, Utc};
use thiserror::Error;

use crate::{
  credentials::Credentials,
  directory::{
    Directory, DirectoryUser, GroupId, Journal, JournalId, NewSubscription,
    NewUser, Subscription, SubscriptionId, UserId,
  },
  role::Role,
  row::{RejectedRow, Row},
};

#[derive(Debug, Error)]
#[error("{0}")]
pub(crate) struct MemoryError(String);

#[derive(Default)]
struct State {
  next_id:         i64,
  journals:        Vec<Journal>,
  groups:          Vec<(GroupId, JournalId, Role)>,
  users:           Vec<(DirectoryUser, String)>,
  memberships:     Vec<(UserId, GroupId)>,
  subscriptions:   Vec<Subscription>,
  rejected_emails: Vec<String>,
  rejected_groups: Vec<GroupId>,
}

impl State {
  fn id(&mut self) -> i64 {
    self.next_id += 1;
    self.next_id
  }
}

pub(crate) struct MemoryDirectory {
  state: Mutex<State>,
}

impl MemoryDirectory {
  pub(crate) fn new() -> Self {
    Self {
      state: Mutex::new(State::default()),
    }
  }

  fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
    f(&mut self.state.lock().unwrap())
  }

  /// A journal with one default group per role.
  pub(crate) fn add_journal(&self, path: &str) -> Journal {
    let journal = self.add_journal_without_groups(path);
    self.with(|s| {
      for role in [Role::Reader, Role::Author, Role::Reviewer] {
        let id = s.id();
        s.groups.push((id, journal.journal_id, role));
      }
    });
    journal
  }

  pub(crate) fn add_journal_without_groups(&self, path: &str) -> Journal {
    self.with(|s| {
      let journal = Journal {
        journal_id:     s.id(),
        path:           path.to_string(),
        primary_locale: "en".to_string(),
      };
      s.journals.push(journal.clone());
      journal
    })
  }

  pub(crate) fn group_for(&self, journal: &Journal, role: Role) -> GroupId {
    self.with(|s| {
      s.groups
        .iter()
        .find(|(_, j, r)| *j == journal.journal_id && *r == role)
        .map(|(id, ..)| *id)
        .unwrap()
    })
  }

  pub(crate) fn add_user(&self, username: &str, email: &str) -> DirectoryUser {
    self.with(|s| {
      let user = DirectoryUser {
        user_id:              s.id(),
        username:             username.to_string(),
        email:                email.to_string(),
        given_name:           "Existing".to_string(),
        family_name:          "User".to_string(),
        affiliation:          None,
        country:              "CA".to_string(),
        locales:              vec!["en".to_string()],
        must_change_password: false,
        registered_at:        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
      };
      s.users.push((user.clone(), String::new()));
      user
    })
  }

  pub(crate) fn add_subscription(&self, input: NewSubscription) -> Subscription {
    self.with(|s| insert_subscription(s, input))
  }

  /// Make `create_user` fail for this email, as a store constraint would.
  pub(crate) fn reject_email(&self, email: &str) {
    self.with(|s| s.rejected_emails.push(email.to_string()));
  }

  /// Make every membership write for `group_id` fail.
  pub(crate) fn reject_group(&self, group_id: GroupId) {
    self.with(|s| s.rejected_groups.push(group_id));
  }

  pub(crate) fn accept_group(&self, group_id: GroupId) {
    self.with(|s| s.rejected_groups.retain(|g| *g != group_id));
  }

  pub(crate) fn user(&self, username: &str) -> Option<DirectoryUser> {
    self.with(|s| {
      s.users
        .iter()
        .find(|(u, _)| u.username == username)
        .map(|(u, _)| u.clone())
    })
  }

  pub(crate) fn password_hash(&self, username: &str) -> Option<String> {
    self.with(|s| {
      s.users
        .iter()
        .find(|(u, _)| u.username == username)
        .map(|(_, hash)| hash.clone())
    })
  }

  pub(crate) fn groups_of(&self, user_id: UserId) -> Vec<GroupId> {
    self.with(|s| {
      s.memberships
        .iter()
        .filter(|(u, _)| *u == user_id)
        .map(|(_, g)| *g)
        .collect()
    })
  }

  pub(crate) fn subscription(
    &self,
    user_id: UserId,
    journal_id: JournalId,
  ) -> Option<Subscription> {
    self.with(|s| find_subscription(s, user_id, journal_id))
  }

  pub(crate) fn user_count(&self) -> usize { self.with(|s| s.users.len()) }

  pub(crate) fn subscription_count(&self) -> usize {
    self.with(|s| s.subscriptions.len())
  }
}

fn insert_subscription(s: &mut State, input: NewSubscription) -> Subscription {
  let subscription = Subscription {
    subscription_id:  s.id(),
    journal_id:       input.journal_id,
    user_id:          input.user_id,
    type_id:          input.type_id,
    date_start:       input.date_start,
    date_end:         input.date_end,
    status:           input.status,
    membership:       input.membership,
    reference_number: input.reference_number,
    notes:            input.notes,
  };
  s.subscriptions.push(subscription.clone());
  subscription
}

fn insert_user(s: &mut State, input: NewUser) -> Result<DirectoryUser, MemoryError> {
  if s.rejected_emails.contains(&input.email)
    || s.users.iter().any(|(u, _)| u.username == input.username)
  {
    return Err(MemoryError(format!("cannot insert {}", input.username)));
  }
  let user = DirectoryUser {
    user_id:              s.id(),
    username:             input.username,
    email:                input.email,
    given_name:           input.given_name,
    family_name:          input.family_name,
    affiliation:          input.affiliation,
    country:              input.country,
    locales:              input.locales,
    must_change_password: input.must_change_password,
    registered_at:        input.registered_at,
  };
  s.users.push((user.clone(), input.password_hash));
  Ok(user)
}

fn find_subscription(
  s: &State,
  user_id: UserId,
  journal_id: JournalId,
) -> Option<Subscription> {
  s.subscriptions
    .iter()
    .find(|sub| sub.user_id == user_id && sub.journal_id == journal_id)
    .cloned()
}

impl Directory for MemoryDirectory {
  type Error = MemoryError;

  async fn journal_by_path(&self, path: &str) -> Result<Option<Journal>, MemoryError> {
    Ok(self.with(|s| s.journals.iter().find(|j| j.path == path).cloned()))
  }

  async fn default_group_for_role(
    &self,
    journal_id: JournalId,
    role: Role,
  ) -> Result<Option<GroupId>, MemoryError> {
    Ok(self.with(|s| {
      s.groups
        .iter()
        .find(|(_, j, r)| *j == journal_id && *r == role)
        .map(|(id, ..)| *id)
    }))
  }

  async fn user_by_username(
    &self,
    username: &str,
  ) -> Result<Option<DirectoryUser>, MemoryError> {
    Ok(self.user(username))
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>, MemoryError> {
    Ok(self.with(|s| {
      s.users
        .iter()
        .find(|(u, _)| u.email.eq_ignore_ascii_case(email))
        .map(|(u, _)| u.clone())
    }))
  }

  async fn create_user(&self, input: NewUser) -> Result<DirectoryUser, MemoryError> {
    self.with(|s| insert_user(s, input))
  }

  async fn create_user_with_groups(
    &self,
    input: NewUser,
    groups: Vec<GroupId>,
  ) -> Result<DirectoryUser, MemoryError> {
    self.with(|s| {
      if let Some(group_id) = groups.iter().find(|&&g| s.rejected_groups.contains(&g)) {
        return Err(MemoryError(format!("cannot join group {group_id}")));
      }
      let user = insert_user(s, input)?;
      for group_id in groups {
        s.memberships.push((user.user_id, group_id));
      }
      Ok(user)
    })
  }

  async fn assign_user_to_group(
    &self,
    user_id: UserId,
    group_id: GroupId,
  ) -> Result<(), MemoryError> {
    self.with(|s| {
      if s.rejected_groups.contains(&group_id) {
        return Err(MemoryError(format!("cannot join group {group_id}")));
      }
      s.memberships.push((user_id, group_id));
      Ok(())
    })
  }

  async fn subscription_for(
    &self,
    user_id: UserId,
    journal_id: JournalId,
  ) -> Result<Option<Subscription>, MemoryError> {
    Ok(self.subscription(user_id, journal_id))
  }

  async fn create_subscription(
    &self,
    input: NewSubscription,
  ) -> Result<Subscription, MemoryError> {
    Ok(self.add_subscription(input))
  }

  async fn extend_subscription(
    &self,
    subscription_id: SubscriptionId,
    date_end: NaiveDate,
  ) -> Result<Subscription, MemoryError> {
    self.with(|s| {
      let sub = s
        .subscriptions
        .iter_mut()
        .find(|sub| sub.subscription_id == subscription_id)
        .ok_or_else(|| MemoryError(format!("no subscription {subscription_id}")))?;
      sub.date_end = date_end;
      Ok(sub.clone())
    })
  }
}

/// A reader rejection carrying the cells that lined up with the header.
#[derive(Debug)]
pub(crate) struct Unpaired {
  pub(crate) row:   Row,
  pub(crate) found: usize,
}

impl fmt::Display for Unpaired {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "line {}: found {} fields", self.row.line, self.found)
  }
}

impl RejectedRow for Unpaired {
  fn line(&self) -> Option<u64> { Some(self.row.line) }

  fn partial(&self) -> Option<&Row> { Some(&self.row) }
}

/// Credentials whose output is predictable in assertions.
pub(crate) struct PlainCredentials;

impl PlainCredentials {
  pub(crate) const GENERATED: &'static str = "generated-pw";
}

impl Credentials for PlainCredentials {
  type Error = Infallible;

  fn generate_password(&self) -> String { Self::GENERATED.to_string() }

  fn hash_password(&self, username: &str, password: &str) -> Result<String, Infallible> {
    Ok(format!("hashed:{username}:{password}"))
  }
}
