//! Parse delimited keyframe tables into header-keyed row records.
//!
//! Each animation asset is a small delimited file with one header line and
//! one row per keyframe. The crate does not interpret the columns: every row
//! becomes a map from header name to the raw field text, so downstream
//! consumers can carry the data through untouched.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// One keyframe row keyed by column header.
pub type Row = BTreeMap<String, String>;

/// Reader settings for a keyframe table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Accept rows whose field count differs from the header.
    pub flexible: bool,
}

impl TableOptions {
    /// Comma-delimited tables (the default).
    pub fn comma() -> Self {
        Self {
            delimiter: b',',
            flexible: false,
        }
    }

    /// Tab-delimited tables.
    pub fn tab() -> Self {
        Self {
            delimiter: b'\t',
            ..Self::comma()
        }
    }

    /// Picks the delimiter from the file extension (`.tsv` => tab, otherwise comma).
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("tsv") => Self::tab(),
            _ => Self::comma(),
        }
    }
}

impl Default for TableOptions {
    fn default() -> Self {
        Self::comma()
    }
}

/// Errors surfaced while reading a keyframe table.
#[derive(Debug)]
pub enum TableError {
    /// The file exists but could not be opened or read.
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The content is not a well-formed delimited table.
    Malformed(csv::Error),
    /// Two columns share the same header name.
    DuplicateHeader(String),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read '{}': {source}", path.display())
            }
            Self::Malformed(err) => write!(f, "malformed keyframe table: {err}"),
            Self::DuplicateHeader(name) => write!(f, "duplicate column header '{name}'"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
            Self::DuplicateHeader(_) => None,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        Self::Malformed(err)
    }
}

/// Parses every row of a delimited table. An input without a header line
/// yields no rows. Header names are trimmed; field values are kept verbatim.
pub fn parse_rows<R: Read>(input: R, options: TableOptions) -> Result<Vec<Row>, TableError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(options.flexible)
        .trim(csv::Trim::Headers)
        .from_reader(input);
    let headers = reader.headers()?.clone();
    let mut seen = Vec::with_capacity(headers.len());
    for name in headers.iter() {
        if seen.contains(&name) {
            return Err(TableError::DuplicateHeader(name.to_string()));
        }
        seen.push(name);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Reads a table from disk. A missing file is reported as `Ok(None)` rather
/// than an error.
pub fn read_rows(path: &Path, options: TableOptions) -> Result<Option<Vec<Row>>, TableError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(TableError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_rows(file, options).map(Some)
}
