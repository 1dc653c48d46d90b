//! Role vocabulary, per-row role slots, and role → group resolution.

use strum::{Display, EnumString};
use tracing::debug;

use crate::{
  Error, Result,
  directory::{Directory, GroupId, Journal},
  row::{Row, columns},
};

/// The roles an imported subscriber may be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Role {
  Reader,
  Author,
  Reviewer,
}

impl Role {
  /// Parse a role cell, mapping anything outside the vocabulary to
  /// [`Error::InvalidRole`].
  pub fn parse(value: &str) -> Result<Self> {
    value
      .parse()
      .map_err(|_| Error::InvalidRole(value.to_string()))
  }
}

/// Up to four role slots. Slot 1 is always filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet {
  slots: [Option<Role>; 4],
}

impl Default for RoleSet {
  fn default() -> Self {
    Self {
      slots: [Some(Role::Reader), None, None, None],
    }
  }
}

impl RoleSet {
  /// Build from the `role1`..`role4` cells of `row`.
  ///
  /// A blank `role1` becomes `Reader`; blank later slots stay empty. Any
  /// non-blank cell outside the vocabulary fails the whole set.
  pub fn from_row(row: &Row) -> Result<Self> {
    let mut slots = [None; 4];
    for (slot, column) in slots.iter_mut().zip(columns::ROLES) {
      *slot = row.non_empty(column).map(Role::parse).transpose()?;
    }
    slots[0].get_or_insert(Role::Reader);
    Ok(Self { slots })
  }

  pub fn from_slots(slots: [Option<Role>; 4]) -> Self {
    let mut set = Self { slots };
    set.slots[0].get_or_insert(Role::Reader);
    set
  }

  /// Filled slots in slot order, duplicates included.
  pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
    self.slots.iter().flatten().copied()
  }
}

/// Map every filled slot of `roles` to the journal's default group for that
/// role, in slot order.
///
/// Duplicate roles yield duplicate group ids unless `dedupe` is set, in which
/// case the first occurrence wins.
pub async fn resolve_groups<D: Directory>(
  directory: &D,
  journal: &Journal,
  roles: &RoleSet,
  dedupe: bool,
) -> Result<Vec<GroupId>> {
  let mut groups = Vec::with_capacity(4);
  for role in roles.iter() {
    let group_id = directory
      .default_group_for_role(journal.journal_id, role)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::GroupNotFound {
        role,
        journal: journal.path.clone(),
      })?;

    if dedupe && groups.contains(&group_id) {
      continue;
    }
    debug!(%role, group_id, journal = %journal.path, "resolved role group");
    groups.push(group_id);
  }
  Ok(groups)
}
