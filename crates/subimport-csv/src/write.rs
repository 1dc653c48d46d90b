//! Outcome report writer.

use std::{fs::File, io, path::Path};

use subimport_core::outcome::ReportRow;

use crate::error::{Error, Result};

/// Report columns, in output order. Matches the serde names on [`ReportRow`].
pub const REPORT_HEADER: [&str; 7] = [
  "firstname",
  "lastname",
  "email",
  "username",
  "tempPassword",
  "country",
  "status",
];

/// Write `rows` to a new file at `path`, replacing any existing file.
///
/// Every failure to create, write or flush the file is returned; nothing is
/// swallowed.
pub fn write_report<'a, I>(path: impl AsRef<Path>, rows: I, delimiter: u8) -> Result<()>
where
  I: IntoIterator<Item = &'a ReportRow>,
{
  let path = path.as_ref();
  let file = File::create(path).map_err(|source| Error::NotWritable {
    path: path.to_path_buf(),
    source,
  })?;
  write_report_to(file, rows, delimiter)
}

/// Write the header and one line per row to `writer`.
pub fn write_report_to<'a, W, I>(writer: W, rows: I, delimiter: u8) -> Result<()>
where
  W: io::Write,
  I: IntoIterator<Item = &'a ReportRow>,
{
  // Header written by hand so an empty batch still produces one.
  let mut wtr = csv::WriterBuilder::new()
    .has_headers(false)
    .delimiter(delimiter)
    .from_writer(writer);

  wtr.write_record(REPORT_HEADER)?;
  for row in rows {
    wtr.serialize(row)?;
  }
  wtr.flush()?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use subimport_core::outcome::Status;

  use super::*;

  #[test]
  fn writes_header_then_rows() {
    let rows = [ReportRow {
      first_name:    "Jane".into(),
      last_name:     "Smith".into(),
      email:         "jane@example.org".into(),
      username:      "smithj".into(),
      temp_password: "pw".into(),
      country:       "CA".into(),
      status:        Status::New,
    }];
    let mut out = Vec::new();
    write_report_to(&mut out, &rows, b',').unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "firstname,lastname,email,username,tempPassword,country,status\n\
       Jane,Smith,jane@example.org,smithj,pw,CA,New\n"
    );
  }

  #[test]
  fn empty_batch_still_has_header() {
    let mut out = Vec::new();
    write_report_to(&mut out, &[], b',').unwrap();
    assert_eq!(
      String::from_utf8(out).unwrap(),
      "firstname,lastname,email,username,tempPassword,country,status\n"
    );
  }

  struct Broken;

  impl io::Write for Broken {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> { Err(io::Error::other("disk full")) }

    fn flush(&mut self) -> io::Result<()> { Err(io::Error::other("disk full")) }
  }

  #[test]
  fn failed_flush_is_an_error() {
    let err = write_report_to(Broken, &[], b',').unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.to_string() == "disk full"));
  }

  #[test]
  fn unwritable_destination_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = write_report(dir.path().join("no/such/dir/report.csv"), &[], b',')
      .unwrap_err();
    assert!(matches!(err, Error::NotWritable { .. }));
  }
}
