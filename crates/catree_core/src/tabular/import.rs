use super::record::{parse_id_cell, parse_parent_cell, read_rows, read_rows_from_path};
use super::{ParentCell, TabularError, TabularRow};
use crate::model::category::CategoryId;
use crate::repo::category_repo::CategoryRepository;
use crate::service::category_service::{
    AddedCategory, CategoryService, CategoryServiceError, ParentRef,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::Path;

/// Row that was read but not applied, with the service's reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub row_number: u64,
    pub name: String,
    pub reason: String,
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Number of categories created.
    pub added: usize,
    /// Rows refused by the service (duplicate name, missing parent, ...).
    pub rejected: Vec<RejectedRow>,
    /// Structurally empty rows that were skipped.
    pub skipped_blank: usize,
}

impl ImportReport {
    /// Human-readable summary line.
    pub fn message(&self) -> String {
        let mut message = format!("Import finished: {} category(ies) added", self.added);
        if !self.rejected.is_empty() {
            message.push_str(&format!(", {} row(s) rejected", self.rejected.len()));
        }
        if self.skipped_blank > 0 {
            message.push_str(&format!(", {} blank row(s) skipped", self.skipped_blank));
        }
        message.push('.');
        for rejected in &self.rejected {
            message.push_str(&format!(
                "\nRow {}: {}",
                rejected.row_number, rejected.reason
            ));
        }
        message
    }
}

/// Fatal import failure. Rows before `row_number` remain applied.
#[derive(Debug)]
pub enum ImportError {
    /// The table itself could not be read.
    Read(TabularError),
    /// `Parent ID` is neither `None` nor a numeric id.
    InvalidParentReference {
        row_number: u64,
        value: String,
        applied: usize,
    },
    /// Storage failed while applying a row.
    IoFailure {
        row_number: u64,
        source: CategoryServiceError,
        applied: usize,
    },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read(err) => write!(f, "Import failed: could not read table: {err}"),
            Self::InvalidParentReference {
                row_number,
                value,
                applied,
            } => write!(
                f,
                "Import aborted at row {row_number}: invalid Parent ID `{value}` \
                 (expected `None` or a numeric id); {applied} category(ies) added before the failure."
            ),
            Self::IoFailure {
                row_number,
                source,
                applied,
            } => write!(
                f,
                "Import aborted at row {row_number}: {source}; {applied} category(ies) added before the failure."
            ),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read(err) => Some(err),
            Self::InvalidParentReference { .. } => None,
            Self::IoFailure { source, .. } => Some(source),
        }
    }
}

impl From<TabularError> for ImportError {
    fn from(value: TabularError) -> Self {
        Self::Read(value)
    }
}

/// Reads a table from `reader` and imports it.
pub fn import_from_reader<R: CategoryRepository, T: Read>(
    service: &CategoryService<R>,
    reader: T,
) -> Result<ImportReport, ImportError> {
    let rows = read_rows(reader)?;
    import_rows(service, &rows)
}

/// Reads the table at `path` and imports it.
pub fn import_from_path<R: CategoryRepository>(
    service: &CategoryService<R>,
    path: impl AsRef<Path>,
) -> Result<ImportReport, ImportError> {
    let rows = read_rows_from_path(path)?;
    import_rows(service, &rows)
}

/// Replays `rows` through the service in order.
///
/// A `Parent ID` naming the `ID` of an earlier row in the same table is
/// resolved to the category created (or matched by name) for that row, so an
/// exported table re-imports into a fresh store regardless of the ids the
/// store assigns. A row whose file parent was rejected is rejected too. Any
/// other numeric `Parent ID` refers to an existing category id.
pub fn import_rows<R: CategoryRepository>(
    service: &CategoryService<R>,
    rows: &[TabularRow],
) -> Result<ImportReport, ImportError> {
    info!(
        "event=tree_import module=tabular status=start rows={}",
        rows.len()
    );
    let mut report = ImportReport::default();
    // Exported ID -> store id, or `None` when that row produced no category.
    let mut imported_ids: HashMap<CategoryId, Option<CategoryId>> = HashMap::new();

    for row in rows {
        if row.is_blank() {
            debug!(
                "event=tree_import_row module=tabular status=skipped row={}",
                row.row_number
            );
            report.skipped_blank += 1;
            continue;
        }

        let Some(parent) = parse_parent_cell(&row.parent_id) else {
            warn!(
                "event=tree_import module=tabular status=error error_code=invalid_parent_reference row={} applied={}",
                row.row_number, report.added
            );
            return Err(ImportError::InvalidParentReference {
                row_number: row.row_number,
                value: row.parent_id.clone(),
                applied: report.added,
            });
        };

        let result = match parent {
            ParentCell::Root => service.add_root(&row.name),
            ParentCell::Id(exported_parent) => match imported_ids.get(&exported_parent) {
                Some(Some(parent_id)) => service.add_child_by_id(*parent_id, &row.name),
                Some(None) => Err(CategoryServiceError::ParentNotFound(ParentRef::Id(
                    exported_parent,
                ))),
                None => service.add_child_by_id(exported_parent, &row.name),
            },
        };

        let resolved_id = match result {
            Ok(AddedCategory { category, .. }) => {
                report.added += 1;
                Some(category.id)
            }
            Err(err @ CategoryServiceError::Repo(_)) => {
                return Err(io_failure(row.row_number, err, report.added));
            }
            Err(err) => {
                debug!(
                    "event=tree_import_row module=tabular status=rejected row={} error_code={}",
                    row.row_number,
                    err.code()
                );
                let existing = match &err {
                    CategoryServiceError::DuplicateName(name) => match service.find_by_name(name) {
                        Ok(found) => found.map(|category| category.id),
                        Err(lookup_err) => {
                            return Err(io_failure(row.row_number, lookup_err, report.added));
                        }
                    },
                    _ => None,
                };
                report.rejected.push(RejectedRow {
                    row_number: row.row_number,
                    name: row.name.clone(),
                    reason: err.to_string(),
                });
                existing
            }
        };

        if let Some(exported_id) = parse_id_cell(&row.id) {
            imported_ids.insert(exported_id, resolved_id);
        }
    }

    info!(
        "event=tree_import module=tabular status=ok added={} rejected={} skipped_blank={}",
        report.added,
        report.rejected.len(),
        report.skipped_blank
    );
    Ok(report)
}

fn io_failure(row_number: u64, source: CategoryServiceError, applied: usize) -> ImportError {
    warn!(
        "event=tree_import module=tabular status=error error_code=io_failure row={row_number} applied={applied}"
    );
    ImportError::IoFailure {
        row_number,
        source,
        applied,
    }
}
