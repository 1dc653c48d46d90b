//! Deterministic, collision-free login handle allocation.

use std::future::Future;

use tracing::debug;

use crate::{Error, Result};

/// The unsuffixed handle: last name lowercased with whitespace removed,
/// followed by the first letter of the lowercased first name.
pub fn base_username(first_name: &str, last_name: &str) -> String {
  let mut handle: String = last_name
    .to_lowercase()
    .chars()
    .filter(|c| !c.is_whitespace())
    .collect();
  if let Some(initial) = first_name.trim_start().to_lowercase().chars().next() {
    handle.push(initial);
  }
  handle
}

/// Find the first free handle among `base`, `base1`, `base2`, …
///
/// `taken` reports whether a candidate already exists in the directory. The
/// search is a loop with a strictly increasing suffix, so it terminates for
/// any finite directory; exhausting the `u32` suffix space yields
/// [`Error::UsernameExhausted`].
pub async fn allocate_username<F, Fut>(
  first_name: &str,
  last_name: &str,
  mut taken: F,
) -> Result<String>
where
  F: FnMut(String) -> Fut,
  Fut: Future<Output = Result<bool>>,
{
  let base = base_username(first_name, last_name);

  if !taken(base.clone()).await? {
    return Ok(base);
  }

  let mut suffix: u32 = 1;
  loop {
    let candidate = format!("{base}{suffix}");
    if !taken(candidate.clone()).await? {
      debug!(%base, %candidate, "allocated suffixed username");
      return Ok(candidate);
    }
    suffix = suffix
      .checked_add(1)
      .ok_or_else(|| Error::UsernameExhausted(base.clone()))?;
  }
}
