use super::{TabularError, HEADER, ROOT_PARENT_MARKER};
use crate::model::category::{Category, CategoryId};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// One data row of an imported table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularRow {
    /// 1-based line in the source file; the header is row 1.
    pub row_number: u64,
    pub id: String,
    pub name: String,
    pub parent_id: String,
}

impl TabularRow {
    /// Returns whether every cell of the row is blank.
    pub fn is_blank(&self) -> bool {
        self.id.is_empty() && self.name.is_empty() && self.parent_id.is_empty()
    }
}

/// Parsed `Parent ID` cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentCell {
    Root,
    Id(CategoryId),
}

/// Parses a `Parent ID` (or `ID`) cell.
///
/// Accepts `None` in any letter case, base-10 integers, and integral decimal
/// text such as `3.0` as written by spreadsheet numeric cells. Returns `None`
/// for anything else.
pub fn parse_parent_cell(value: &str) -> Option<ParentCell> {
    let value = value.trim();
    if value.eq_ignore_ascii_case(ROOT_PARENT_MARKER) {
        return Some(ParentCell::Root);
    }
    parse_id_cell(value).map(ParentCell::Id)
}

pub(super) fn parse_id_cell(value: &str) -> Option<CategoryId> {
    let value = value.trim();
    if let Ok(id) = value.parse::<CategoryId>() {
        return Some(id);
    }

    let float = value.parse::<f64>().ok()?;
    let in_range = float >= CategoryId::MIN as f64 && float <= CategoryId::MAX as f64;
    if float.is_finite() && float.fract() == 0.0 && in_range {
        Some(float as CategoryId)
    } else {
        None
    }
}

/// Writes `categories` as a header row plus one row per category.
pub fn export_categories<W: Write>(
    writer: W,
    categories: &[Category],
) -> Result<(), TabularError> {
    let mut wtr = WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER)?;
    for category in categories {
        let parent = category
            .parent_id
            .map_or_else(|| ROOT_PARENT_MARKER.to_string(), |id| id.to_string());
        wtr.write_record([
            category.id.to_string().as_str(),
            category.name.as_str(),
            parent.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Creates (or truncates) `path` and exports `categories` into it.
pub fn export_to_path(path: impl AsRef<Path>, categories: &[Category]) -> Result<(), TabularError> {
    let file = File::create(path)?;
    export_categories(file, categories)
}

/// Reads every data row after the header.
///
/// Short rows are padded with blank cells and cells are trimmed; extra
/// columns are ignored.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<TabularRow>, TabularError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in rdr.records().enumerate() {
        let record = record?;
        let row_number = record
            .position()
            .map_or(index as u64 + 2, |position| position.line());
        let cell = |column: usize| record.get(column).unwrap_or_default().to_string();
        rows.push(TabularRow {
            row_number,
            id: cell(0),
            name: cell(1),
            parent_id: cell(2),
        });
    }
    Ok(rows)
}

/// Opens `path` and reads its data rows.
pub fn read_rows_from_path(path: impl AsRef<Path>) -> Result<Vec<TabularRow>, TabularError> {
    let file = File::open(path)?;
    read_rows(file)
}
