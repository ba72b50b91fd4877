//! Category store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide keyed persistence for categories: by id, by unique name, save,
//!   cascading delete and full listing.
//! - Keep SQL details and ordering behavior inside the repository boundary.
//!
//! # Invariants
//! - `find_all` returns categories in insertion order (`id ASC`).
//! - `update` never moves a category under itself or its own descendants.
//! - `delete` removes the target and every descendant in one transaction and
//!   never leaves a child pointing at a deleted parent.
//! - Subtree walks use `UNION`, so they terminate even on a cyclic store.
//! - Name uniqueness is also enforced by a UNIQUE constraint; violations are
//!   reported as `RepoError::DuplicateName`, not as raw SQLite errors.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::category::{Category, CategoryId, NewCategory};
use rusqlite::{
    ffi, params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::error::Error;
use std::fmt::{Display, Formatter};

const CATEGORY_SELECT_SQL: &str = "SELECT id, name, parent_id FROM categories";

/// Ids of the category `?1` and all its descendants, as table `subtree`.
const SUBTREE_CTE_SQL: &str = "WITH RECURSIVE subtree(id) AS (
    SELECT id FROM categories WHERE id = ?1
    UNION
    SELECT child.id
    FROM categories child
    INNER JOIN subtree parent ON child.parent_id = parent.id
)";

/// Result type used by category repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from category repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target category does not exist.
    NotFound(CategoryId),
    /// Another category already uses this name.
    DuplicateName(String),
    /// Referenced parent category does not exist.
    ParentNotFound(CategoryId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted or submitted data violates a storage constraint.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "category not found: {id}"),
            Self::DuplicateName(name) => write!(f, "category name already exists: {name}"),
            Self::ParentNotFound(id) => write!(f, "parent category not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "category repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "category repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "category repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid category data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface consumed by the category service.
pub trait CategoryRepository {
    /// Loads one category by id.
    fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>>;
    /// Loads one category by its exact (case-sensitive) name.
    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>>;
    /// Inserts a new category and returns it with its assigned id.
    fn save(&self, category: &NewCategory) -> RepoResult<Category>;
    /// Updates name and parent of an existing category in place.
    ///
    /// Fails with `InvalidData` when the new parent is the category itself or
    /// one of its descendants.
    fn update(&self, category: &Category) -> RepoResult<()>;
    /// Deletes one category and its whole subtree.
    ///
    /// Returns the number of removed categories, target included.
    fn delete(&self, id: CategoryId) -> RepoResult<usize>;
    /// Lists every stored category in insertion order.
    fn find_all(&self) -> RepoResult<Vec<Category>>;
}

/// SQLite-backed category repository.
pub struct SqliteCategoryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCategoryRepository<'conn> {
    /// Creates repository from migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_category_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl CategoryRepository for SqliteCategoryRepository<'_> {
    fn find_by_id(&self, id: CategoryId) -> RepoResult<Option<Category>> {
        self.conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE id = ?1;"),
                [id],
                parse_category_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Option<Category>> {
        self.conn
            .query_row(
                &format!("{CATEGORY_SELECT_SQL} WHERE name = ?1;"),
                [name],
                parse_category_row,
            )
            .optional()
            .map_err(Into::into)
    }

    fn save(&self, category: &NewCategory) -> RepoResult<Category> {
        self.conn
            .execute(
                "INSERT INTO categories (name, parent_id) VALUES (?1, ?2);",
                params![category.name.as_str(), category.parent_id],
            )
            .map_err(|err| map_write_error(err, &category.name, category.parent_id))?;

        Ok(Category {
            id: self.conn.last_insert_rowid(),
            name: category.name.clone(),
            parent_id: category.parent_id,
        })
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if let Some(parent_id) = category.parent_id {
            if subtree_contains(&tx, category.id, parent_id)? {
                return Err(RepoError::InvalidData(format!(
                    "category {} cannot move under its own subtree (parent {parent_id})",
                    category.id
                )));
            }
        }

        let changed = tx
            .execute(
                "UPDATE categories SET name = ?2, parent_id = ?3 WHERE id = ?1;",
                params![category.id, category.name.as_str(), category.parent_id],
            )
            .map_err(|err| map_write_error(err, &category.name, category.parent_id))?;
        if changed == 0 {
            return Err(RepoError::NotFound(category.id));
        }
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, id: CategoryId) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        if !category_exists(&tx, id)? {
            return Err(RepoError::NotFound(id));
        }

        let subtree_size = count_subtree(&tx, id)?;
        tx.execute(
            &format!(
                "{SUBTREE_CTE_SQL} DELETE FROM categories WHERE id IN (SELECT id FROM subtree);"
            ),
            [id],
        )?;

        tx.commit()?;
        Ok(subtree_size)
    }

    fn find_all(&self) -> RepoResult<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{CATEGORY_SELECT_SQL} ORDER BY id ASC;"))?;
        let rows = stmt.query_map([], parse_category_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn parse_category_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get("id")?,
        name: row.get("name")?,
        parent_id: row.get("parent_id")?,
    })
}

fn map_write_error(err: rusqlite::Error, name: &str, parent_id: Option<CategoryId>) -> RepoError {
    if let rusqlite::Error::SqliteFailure(failure, _) = &err {
        if failure.code == ErrorCode::ConstraintViolation {
            match failure.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE => {
                    return RepoError::DuplicateName(name.to_string());
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    if let Some(parent_id) = parent_id {
                        return RepoError::ParentNotFound(parent_id);
                    }
                }
                ffi::SQLITE_CONSTRAINT_CHECK => {
                    return RepoError::InvalidData(format!("rejected category name `{name}`"));
                }
                _ => {}
            }
        }
    }
    err.into()
}

fn category_exists(conn: &Connection, id: CategoryId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1);",
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn count_subtree(conn: &Connection, id: CategoryId) -> RepoResult<usize> {
    let count: i64 = conn.query_row(
        &format!("{SUBTREE_CTE_SQL} SELECT COUNT(*) FROM subtree;"),
        [id],
        |row| row.get(0),
    )?;
    usize::try_from(count)
        .map_err(|_| RepoError::InvalidData(format!("negative subtree size {count}")))
}

fn subtree_contains(conn: &Connection, root: CategoryId, candidate: CategoryId) -> RepoResult<bool> {
    let contains: i64 = conn.query_row(
        &format!("{SUBTREE_CTE_SQL} SELECT EXISTS(SELECT 1 FROM subtree WHERE id = ?2);"),
        params![root, candidate],
        |row| row.get(0),
    )?;
    Ok(contains == 1)
}

fn ensure_category_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    if !table_exists(conn, "categories")? {
        return Err(RepoError::MissingRequiredTable("categories"));
    }

    for column in ["id", "name", "parent_id"] {
        if !table_has_column(conn, "categories", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "categories",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
