//! Tabular (ID, Name, Parent ID) export and import of the category tree.
//!
//! # Responsibility
//! - Serialize the flat category list into a three-column CSV table.
//! - Read such a table back and replay it through the category service.
//!
//! # Invariants
//! - Row 1 is always the header `ID,Name,Parent ID` and never data.
//! - `Parent ID` is either the literal `None` (root) or a base-10 id.
//! - Import stops at the first invalid parent reference or storage failure;
//!   rows applied before that point stay applied.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod import;
mod record;

pub use import::{
    import_from_path, import_from_reader, import_rows, ImportError, ImportReport, RejectedRow,
};
pub use record::{
    export_categories, export_to_path, parse_parent_cell, read_rows, read_rows_from_path,
    ParentCell, TabularRow,
};

/// File name used when exporting into a directory.
pub const DEFAULT_EXPORT_FILE_NAME: &str = "Categories.csv";

/// Column titles of the header row, in order.
pub const HEADER: [&str; 3] = ["ID", "Name", "Parent ID"];

/// `Parent ID` cell value marking a root category.
pub const ROOT_PARENT_MARKER: &str = "None";

/// Errors while reading or writing tabular data.
#[derive(Debug)]
pub enum TabularError {
    /// Malformed CSV or CSV-level I/O failure.
    Csv(csv::Error),
    /// Plain I/O failure (flush, file open).
    Io(std::io::Error),
}

impl Display for TabularError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Csv(err) => write!(f, "csv error: {err}"),
            Self::Io(err) => write!(f, "i/o error: {err}"),
        }
    }
}

impl Error for TabularError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Csv(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<csv::Error> for TabularError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<std::io::Error> for TabularError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
