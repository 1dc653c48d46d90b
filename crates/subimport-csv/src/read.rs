//! Delimited input reader.
//!
//! Pipeline:
//!   file / reader
//!     └─ csv records (flexible width)
//!          └─ normalize_cell() on every cell
//!               └─ header row → column names
//!                    └─ data rows → Row (or FieldCount in place)

use std::{
  fs::{self, File},
  io,
  path::Path,
};

use subimport_core::row::Row;
use tracing::debug;

use crate::{
  Table,
  error::{Error, Result},
};

/// Strip zero-width and no-break space characters, then trim.
///
/// Spreadsheet exports routinely smuggle U+200B–U+200D, U+FEFF and U+00A0
/// into cells, where they defeat equality checks on emails and usernames.
pub fn normalize_cell(cell: &str) -> String {
  let visible: String = cell
    .chars()
    .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}' | '\u{00A0}'))
    .collect();
  visible.trim().to_string()
}

/// Read the delimited file at `path`.
///
/// Fails with [`Error::NotFound`] if nothing exists at `path` and
/// [`Error::NotReadable`] if it is a directory or cannot be opened.
pub fn read_path(path: impl AsRef<Path>, delimiter: u8) -> Result<Table> {
  let path = path.as_ref();

  let metadata = fs::metadata(path).map_err(|source| {
    if source.kind() == io::ErrorKind::NotFound {
      Error::NotFound(path.to_path_buf())
    } else {
      Error::NotReadable {
        path: path.to_path_buf(),
        source,
      }
    }
  })?;

  if metadata.is_dir() {
    return Err(Error::NotReadable {
      path:   path.to_path_buf(),
      source: io::Error::other("is a directory"),
    });
  }

  let file = File::open(path).map_err(|source| Error::NotReadable {
    path: path.to_path_buf(),
    source,
  })?;

  read_from(file, delimiter)
}

/// Read delimited text from any reader. The first record is the header.
pub fn read_from<R: io::Read>(reader: R, delimiter: u8) -> Result<Table> {
  let mut csv_reader = csv::ReaderBuilder::new()
    .has_headers(false)
    .flexible(true)
    .delimiter(delimiter)
    .from_reader(reader);

  let mut records = csv_reader.records();

  let header: Vec<String> = match records.next() {
    Some(record) => record?.iter().map(normalize_cell).collect(),
    None => {
      return Ok(Table {
        header: Vec::new(),
        rows:   Vec::new(),
      });
    }
  };
  check_unique(&header)?;

  let mut rows = Vec::new();
  for result in records {
    let record = match result {
      Ok(record) => record,
      Err(e) if matches!(e.kind(), csv::ErrorKind::Io(_)) => return Err(e.into()),
      Err(e) => {
        rows.push(Err(e.into()));
        continue;
      }
    };

    let line = record.position().map(|p| p.line()).unwrap_or_default();
    let cells: Vec<String> = record.iter().map(normalize_cell).collect();

    if cells.iter().all(String::is_empty) {
      debug!(line, "skipping blank row");
      continue;
    }

    if cells.len() != header.len() {
      let found = cells.len();
      rows.push(Err(Error::FieldCount {
        line,
        expected: header.len(),
        found,
        row: Row::new(line, header.iter().cloned().zip(cells)),
      }));
      continue;
    }

    rows.push(Ok(Row::new(line, header.iter().cloned().zip(cells))));
  }

  Ok(Table { header, rows })
}

/// Reject headers naming the same column twice (ASCII case-insensitive).
fn check_unique(header: &[String]) -> Result<()> {
  for (i, name) in header.iter().enumerate() {
    if name.is_empty() {
      continue;
    }
    if header[..i].iter().any(|prev| prev.eq_ignore_ascii_case(name)) {
      return Err(Error::DuplicateColumn(name.clone()));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use subimport_core::row::RejectedRow as _;

  use super::*;

  fn read(input: &str) -> Table { read_from(input.as_bytes(), b',').unwrap() }

  #[test]
  fn pairs_cells_with_header() {
    let table = read("firstname,lastname,email\nJane,Smith,jane@example.org\n");
    assert_eq!(table.header, vec!["firstname", "lastname", "email"]);
    assert_eq!(table.rows.len(), 1);
    let row = table.rows[0].as_ref().unwrap();
    assert_eq!(row.line, 2);
    assert_eq!(row.get("lastname"), Some("Smith"));
    assert_eq!(row.get("email"), Some("jane@example.org"));
  }

  #[test]
  fn strips_invisible_characters_and_whitespace() {
    assert_eq!(normalize_cell("John\u{200B}"), "John");
    assert_eq!(normalize_cell("\u{FEFF}firstname"), "firstname");
    assert_eq!(normalize_cell("  jane\u{00A0}@example.org \u{200D}"), "jane@example.org");
    assert_eq!(normalize_cell("\u{200C}"), "");

    let table = read("\u{FEFF}firstname, email \nJohn\u{200B},\u{00A0}john@example.org\n");
    let row = table.rows[0].as_ref().unwrap();
    assert_eq!(row.get("firstname"), Some("John"));
    assert_eq!(row.get("email"), Some("john@example.org"));
  }

  #[test]
  fn mismatched_width_is_rejected_in_place() {
    let table = read("a,b,c\n1,2,3\n4,5\n6,7,8,9\n10,11,12\n");
    assert_eq!(table.rows.len(), 4);
    assert!(table.rows[0].is_ok());
    assert!(matches!(
      table.rows[1],
      Err(Error::FieldCount { line: 3, expected: 3, found: 2, .. })
    ));
    assert!(matches!(
      table.rows[2],
      Err(Error::FieldCount { line: 4, expected: 3, found: 4, .. })
    ));
    let last = table.rows[3].as_ref().unwrap();
    assert_eq!(last.get("c"), Some("12"));
  }

  #[test]
  fn rejected_rows_keep_their_paired_cells() {
    let table = read("firstname,email,country
Jane,jane@example.org
John,john@example.org,US,extra
");

    let short = table.rows[0].as_ref().unwrap_err();
    assert_eq!(short.line(), Some(2));
    let cells = short.partial().unwrap();
    assert_eq!(cells.get("email"), Some("jane@example.org"));
    assert_eq!(cells.get("country"), None);

    let long = table.rows[1].as_ref().unwrap_err();
    assert_eq!(long.line(), Some(3));
    let cells = long.partial().unwrap();
    assert_eq!(cells.line, 3);
    assert_eq!(cells.get("email"), Some("john@example.org"));
    assert_eq!(cells.get("country"), Some("US"));
  }

  #[test]
  fn quoted_cells_keep_delimiters() {
    let table = read("name,affiliation\n\"Smith, Jane\",\"Simon Fraser University\"\n");
    let row = table.rows[0].as_ref().unwrap();
    assert_eq!(row.get("name"), Some("Smith, Jane"));
  }

  #[test]
  fn blank_rows_are_skipped() {
    let table = read("a,b\n1,2\n\n,\n3,4\n");
    let firsts: Vec<&str> = table
      .rows
      .iter()
      .map(|r| r.as_ref().unwrap().get("a").unwrap())
      .collect();
    assert_eq!(firsts, vec!["1", "3"]);
  }

  #[test]
  fn semicolon_delimiter() {
    let table = read_from("a;b\n1;2\n".as_bytes(), b';').unwrap();
    assert_eq!(table.rows[0].as_ref().unwrap().get("b"), Some("2"));
  }

  #[test]
  fn empty_input_yields_empty_table() {
    let table = read("");
    assert!(table.header.is_empty());
    assert!(table.rows.is_empty());
  }

  #[test]
  fn duplicate_header_is_fatal() {
    let err = read_from("email,Email\n".as_bytes(), b',').unwrap_err();
    assert!(matches!(err, Error::DuplicateColumn(ref c) if c == "Email"));
  }

  #[test]
  fn missing_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_path(dir.path().join("absent.csv"), b',').unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
  }

  #[test]
  fn directory_is_not_readable() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_path(dir.path(), b',').unwrap_err();
    assert!(matches!(err, Error::NotReadable { .. }));
  }

  #[test]
  fn reads_from_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "email,country").unwrap();
    writeln!(file, "a@example.org,NZ").unwrap();
    let table = read_path(file.path(), b',').unwrap();
    assert_eq!(table.rows[0].as_ref().unwrap().get("country"), Some("NZ"));
  }
}
