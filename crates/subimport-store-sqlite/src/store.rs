//! [`SqliteDirectory`]: the SQLite implementation of [`Directory`].

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use subimport_core::{
  directory::{
    Directory, DirectoryUser, GroupId, Journal, JournalId, NewSubscription, NewUser,
    Subscription, SubscriptionId, UserId,
  },
  role::Role,
};

use crate::{
  Error, Result,
  encode::{
    JOURNAL_COLUMNS, RawSubscription, RawUser, SUBSCRIPTION_COLUMNS, USER_COLUMNS, encode_date,
    decode_role, encode_dt, encode_locales, encode_role, encode_status, journal_from_row,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A user directory backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteDirectory {
  conn: tokio_rusqlite::Connection,
}

impl SqliteDirectory {
  /// Open (or create) a directory at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory directory. Useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Administration ────────────────────────────────────────────────────

  /// Register a journal. Fails with [`Error::JournalExists`] if `path` is
  /// already taken.
  pub async fn add_journal(&self, path: &str, primary_locale: &str) -> Result<Journal> {
    let path_str = path.to_owned();
    let locale = primary_locale.to_owned();

    let id: Option<JournalId> = self
      .conn
      .call(move |conn| {
        let taken = conn
          .query_row(
            "SELECT 1 FROM journals WHERE path = ?1",
            rusqlite::params![path_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if taken {
          return Ok(None);
        }

        conn.execute(
          "INSERT INTO journals (path, primary_locale) VALUES (?1, ?2)",
          rusqlite::params![path_str, locale],
        )?;
        Ok(Some(conn.last_insert_rowid()))
      })
      .await?;

    let journal_id = id.ok_or_else(|| Error::JournalExists(path.to_owned()))?;
    debug!(journal_id, path, "journal added");

    Ok(Journal {
      journal_id,
      path: path.to_owned(),
      primary_locale: primary_locale.to_owned(),
    })
  }

  /// Add a user group for `role` within a journal.
  pub async fn add_group(
    &self,
    journal_id: JournalId,
    role: Role,
    is_default: bool,
  ) -> Result<GroupId> {
    let role_str = encode_role(role);

    let group_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO user_groups (journal_id, role, is_default) VALUES (?1, ?2, ?3)",
          rusqlite::params![journal_id, role_str, is_default],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(group_id)
  }

  /// Register a journal together with one default group per role.
  pub async fn add_journal_with_default_groups(
    &self,
    path: &str,
    primary_locale: &str,
  ) -> Result<Journal> {
    let journal = self.add_journal(path, primary_locale).await?;
    for role in [Role::Reader, Role::Author, Role::Reviewer] {
      self.add_group(journal.journal_id, role, true).await?;
    }
    Ok(journal)
  }

  /// Group ids a user belongs to, ascending.
  pub async fn groups_for_user(&self, user_id: UserId) -> Result<Vec<GroupId>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT group_id FROM user_user_groups WHERE user_id = ?1 ORDER BY group_id",
        )?;
        let ids = stmt
          .query_map(rusqlite::params![user_id], |row| row.get(0))?
          .collect::<rusqlite::Result<Vec<GroupId>>>()?;
        Ok(ids)
      })
      .await?;
    Ok(ids)
  }

  /// The role a group was created for, if the group exists.
  pub async fn group_role(&self, group_id: GroupId) -> Result<Option<Role>> {
    let role_str: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT role FROM user_groups WHERE group_id = ?1",
              rusqlite::params![group_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    role_str.as_deref().map(decode_role).transpose()
  }

  /// The stored password hash for `user_id`, if the user exists.
  pub async fn password_hash(&self, user_id: UserId) -> Result<Option<String>> {
    let hash: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT password FROM users WHERE user_id = ?1",
              rusqlite::params![user_id],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(hash)
  }

  async fn user_where(&self, column: &'static str, value: &str) -> Result<Option<DirectoryUser>> {
    let value = value.to_owned();
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1");

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![value], RawUser::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn subscription_by_id(&self, id: SubscriptionId) -> Result<Option<Subscription>> {
    let sql = format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE subscription_id = ?1");

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawSubscription::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }
}

// ─── Directory impl ──────────────────────────────────────────────────────────

impl Directory for SqliteDirectory {
  type Error = Error;

  // ── Journals and groups ───────────────────────────────────────────────

  async fn journal_by_path(&self, path: &str) -> Result<Option<Journal>> {
    let path = path.to_owned();
    let sql = format!("SELECT {JOURNAL_COLUMNS} FROM journals WHERE path = ?1");

    let journal: Option<Journal> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![path], journal_from_row)
            .optional()?,
        )
      })
      .await?;

    Ok(journal)
  }

  async fn default_group_for_role(
    &self,
    journal_id: JournalId,
    role: Role,
  ) -> Result<Option<GroupId>> {
    let role_str = encode_role(role);

    let group_id: Option<GroupId> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT group_id FROM user_groups
               WHERE journal_id = ?1 AND role = ?2 AND is_default = 1
               ORDER BY group_id LIMIT 1",
              rusqlite::params![journal_id, role_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    Ok(group_id)
  }

  // ── Users ─────────────────────────────────────────────────────────────

  async fn user_by_username(&self, username: &str) -> Result<Option<DirectoryUser>> {
    self.user_where("username", username).await
  }

  async fn user_by_email(&self, email: &str) -> Result<Option<DirectoryUser>> {
    self.user_where("email", email).await
  }

  async fn create_user(&self, input: NewUser) -> Result<DirectoryUser> {
    self.create_user_with_groups(input, Vec::new()).await
  }

  async fn create_user_with_groups(
    &self,
    input: NewUser,
    groups: Vec<GroupId>,
  ) -> Result<DirectoryUser> {
    let username_str    = input.username.clone();
    let email_str       = input.email.clone();
    let given_str       = input.given_name.clone();
    let family_str      = input.family_name.clone();
    let affiliation_str = input.affiliation.clone();
    let country_str     = input.country.clone();
    let locales_str     = encode_locales(&input.locales)?;
    let password_hash   = input.password_hash;
    let must_change     = input.must_change_password;
    let registered_str  = encode_dt(input.registered_at);
    let group_count     = groups.len();

    // Dropping `tx` on any early return rolls the insert back.
    let user_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (
             username, email, given_name, family_name, affiliation,
             country, locales, password, must_change_password, date_registered
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            username_str,
            email_str,
            given_str,
            family_str,
            affiliation_str,
            country_str,
            locales_str,
            password_hash,
            must_change,
            registered_str,
          ],
        )?;
        let user_id = tx.last_insert_rowid();
        for group_id in groups {
          tx.execute(
            "INSERT OR IGNORE INTO user_user_groups (user_id, group_id) VALUES (?1, ?2)",
            rusqlite::params![user_id, group_id],
          )?;
        }
        tx.commit()?;
        Ok(user_id)
      })
      .await?;

    debug!(user_id, username = %input.username, groups = group_count, "user created");

    Ok(DirectoryUser {
      user_id,
      username: input.username,
      email: input.email,
      given_name: input.given_name,
      family_name: input.family_name,
      affiliation: input.affiliation,
      country: input.country,
      locales: input.locales,
      must_change_password: input.must_change_password,
      registered_at: input.registered_at,
    })
  }

  async fn assign_user_to_group(&self, user_id: UserId, group_id: GroupId) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO user_user_groups (user_id, group_id) VALUES (?1, ?2)",
          rusqlite::params![user_id, group_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Subscriptions ─────────────────────────────────────────────────────

  async fn subscription_for(
    &self,
    user_id: UserId,
    journal_id: JournalId,
  ) -> Result<Option<Subscription>> {
    let sql = format!(
      "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE user_id = ?1 AND journal_id = ?2"
    );

    let raw: Option<RawSubscription> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![user_id, journal_id], RawSubscription::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawSubscription::into_subscription).transpose()
  }

  async fn create_subscription(&self, input: NewSubscription) -> Result<Subscription> {
    let journal_id    = input.journal_id;
    let user_id       = input.user_id;
    let type_id       = input.type_id;
    let start_str     = encode_date(input.date_start);
    let end_str       = encode_date(input.date_end);
    let status_str    = encode_status(input.status);
    let membership    = input.membership.clone();
    let reference_str = input.reference_number.clone();
    let notes_str     = input.notes.clone();

    let subscription_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subscriptions (
             journal_id, user_id, type_id, date_start, date_end,
             status, membership, reference_number, notes
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
          rusqlite::params![
            journal_id,
            user_id,
            type_id,
            start_str,
            end_str,
            status_str,
            membership,
            reference_str,
            notes_str,
          ],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    debug!(subscription_id, user_id = input.user_id, "subscription created");

    Ok(Subscription {
      subscription_id,
      journal_id: input.journal_id,
      user_id: input.user_id,
      type_id: input.type_id,
      date_start: input.date_start,
      date_end: input.date_end,
      status: input.status,
      membership: input.membership,
      reference_number: input.reference_number,
      notes: input.notes,
    })
  }

  async fn extend_subscription(
    &self,
    subscription_id: SubscriptionId,
    date_end: NaiveDate,
  ) -> Result<Subscription> {
    let end_str = encode_date(date_end);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subscriptions SET date_end = ?1 WHERE subscription_id = ?2",
          rusqlite::params![end_str, subscription_id],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::SubscriptionNotFound(subscription_id));
    }

    self
      .subscription_by_id(subscription_id)
      .await?
      .ok_or(Error::SubscriptionNotFound(subscription_id))
  }
}
